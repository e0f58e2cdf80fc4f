//! The interactive driver: couples the parser, the assembler state
//! and the execution engine, and owns the auto-execute state machine.

use crate::command::Command;
use log::debug;
use masm::Assembler;
use mips::{bits, constants, Address, Exec, Memory, Processor, Register, StdIo, SysIo, Word};
use std::fs;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Display base for register and memory values.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Base {
    Hex,
    Dec,
    Oct,
    Bin,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Settings {
    /// Execute each newly assembled instruction immediately.
    pub auto_execute: bool,
    /// Print the register file after every executed instruction.
    pub auto_dump: bool,
    /// Print each instruction just before it executes.
    pub trace: bool,
    /// Print the parsed form of each line.
    pub verbose: bool,
    pub base: Base,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            auto_execute: true,
            auto_dump: false,
            trace: false,
            verbose: false,
            base: Base::Hex,
        }
    }
}

pub struct Interpreter {
    processor: Processor,
    memory: Memory,
    assembler: Assembler,
    io: Box<dyn SysIo>,
    settings: Settings,
    paused_text_location: Option<Address>,
}

impl Interpreter {
    pub fn new(settings: Settings) -> Interpreter {
        Interpreter::with_io(settings, Box::new(StdIo))
    }

    pub fn with_io(settings: Settings, io: Box<dyn SysIo>) -> Interpreter {
        Interpreter {
            processor: Processor::new(),
            memory: Memory::new(),
            assembler: Assembler::new(),
            io,
            settings,
            paused_text_location: None,
        }
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn paused_text_location(&self) -> Option<Address> {
        self.paused_text_location
    }

    /// Reads lines from stdin until `:exit`, an exit syscall, or end
    /// of input. Returns the process exit code.
    pub fn run(&mut self, initial_file: Option<&str>) -> i32 {
        if let Some(path) = initial_file {
            self.open_file(path);
        }

        let stdin = io::stdin();
        loop {
            print!("mips> ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return 0,
                Ok(_) => {}
            }
            if let Some(code) = self.handle_line(&line) {
                return code;
            }
        }
    }

    /// Processes one input line: blank, meta-command, or assembly.
    /// Returns an exit code when the interpreter should terminate.
    pub fn handle_line(&mut self, line: &str) -> Option<i32> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.is_ascii() {
            return self.run_command(Command::Invalid(line.to_string()));
        }
        if line.starts_with(':') {
            return self.run_command(Command::parse(line));
        }
        self.assemble_line(line)
    }

    fn assemble_line(&mut self, line: &str) -> Option<i32> {
        let location = self.assembler.current_location();
        let batch = match masm::parse_line(line, location) {
            Ok(batch) => batch,
            Err(err) => {
                eprintln!("{}", err);
                return None;
            }
        };

        if self.settings.verbose {
            for instruction in &batch {
                println!(
                    "{:#010x}  {:?}  (pc += {})",
                    instruction.location(),
                    instruction.kind(),
                    instruction.pc_increment()
                );
            }
        }

        match self.assembler.commit(batch, &mut self.memory) {
            Err(err) => {
                eprintln!("{}", err);
                None
            }
            Ok(commit) => {
                if commit.unresolved {
                    if self.settings.auto_execute {
                        self.pause(commit.location);
                        println!(
                            "auto-execute paused on an unresolved reference at {:#010x}",
                            commit.location
                        );
                    }
                    None
                } else if commit.executable && self.settings.auto_execute {
                    self.run_from(commit.location)
                } else {
                    None
                }
            }
        }
    }

    fn pause(&mut self, location: Address) {
        self.settings.auto_execute = false;
        if self.paused_text_location.is_none() {
            self.paused_text_location = Some(location);
        }
    }

    /// Steps instructions starting at `start` until no instruction is
    /// stored at the program counter. Jumps and taken branches are
    /// followed.
    fn run_from(&mut self, start: Address) -> Option<i32> {
        let mut pc = start;
        while let Some(instruction) = self.assembler.instruction_at(pc) {
            if !instruction.is_executable() {
                break;
            }
            if self.settings.trace {
                println!("{}", instruction);
            }
            match self.processor.execute(
                &mut self.memory,
                &mut *self.io,
                instruction,
                self.assembler.labels(),
            ) {
                Ok(Exec::Exit(code)) => return Some(code),
                Ok(_) => {}
                Err(err) => {
                    eprintln!("{}", err);
                    if err.halts_execution() {
                        break;
                    }
                }
            }
            if self.settings.auto_dump {
                self.dump_registers();
            }
            pc = self.processor.registers().pc();
        }
        None
    }

    fn run_command(&mut self, command: Command) -> Option<i32> {
        debug!("command: {:?}", command);
        match command {
            Command::AutoExecute => {
                self.settings.auto_execute = !self.settings.auto_execute;
                println!("auto-execute: {}", on_off(self.settings.auto_execute));
                if self.settings.auto_execute {
                    if let Some(location) = self.paused_text_location.take() {
                        return self.run_from(location);
                    }
                }
                None
            }
            Command::Execute => {
                let start = self
                    .paused_text_location
                    .unwrap_or_else(|| self.processor.registers().pc());
                let exit = self.run_from(start);
                if self.settings.auto_execute {
                    self.paused_text_location = None;
                } else {
                    self.paused_text_location = Some(self.processor.registers().pc());
                }
                exit
            }
            Command::Trace => {
                self.settings.trace = !self.settings.trace;
                println!("trace: {}", on_off(self.settings.trace));
                None
            }
            Command::Verbose => {
                self.settings.verbose = !self.settings.verbose;
                println!("verbose: {}", on_off(self.settings.verbose));
                None
            }
            Command::AutoDump => {
                self.settings.auto_dump = !self.settings.auto_dump;
                println!("auto-dump: {}", on_off(self.settings.auto_dump));
                None
            }
            Command::RegisterDump => {
                self.dump_registers();
                None
            }
            Command::Register(name) => {
                match self.named_register_value(&name) {
                    Some(value) => {
                        println!("{} = {}", name, format_word(value, self.settings.base))
                    }
                    None => eprintln!("invalid register {}", name),
                }
                None
            }
            Command::LabelDump => {
                let mut entries: Vec<(&String, &Address)> =
                    self.assembler.labels().iter().collect();
                entries.sort_by_key(|(_, address)| **address);
                for (name, address) in entries {
                    println!("{:#010x}  {}", address, name);
                }
                None
            }
            Command::Label(name) => {
                match self.assembler.label_address(&name) {
                    Some(address) => println!("{:#010x}  {}", address, name),
                    None => eprintln!("undefined label {}", name),
                }
                None
            }
            Command::Unresolved => {
                for (name, locations) in self.assembler.unresolved() {
                    let rendered: Vec<String> =
                        locations.iter().map(|l| format!("{:#010x}", l)).collect();
                    println!("{}  referenced at {}", name, rendered.join(", "));
                }
                None
            }
            Command::InstructionDump => {
                for instruction in self.assembler.sorted_instructions() {
                    self.print_instruction_line(instruction.location());
                }
                None
            }
            Command::Instruction(target, count) => {
                let start = match target {
                    Some(ref text) => self.resolve_target(text),
                    None => Some(self.processor.registers().pc()),
                };
                match start {
                    Some(mut address) => {
                        for _ in 0..count.unwrap_or(1) {
                            match self.assembler.instruction_at(address) {
                                Some(instruction) => {
                                    self.print_instruction_line(address);
                                    address =
                                        address.wrapping_add(instruction.pc_increment().max(4));
                                }
                                None => break,
                            }
                        }
                    }
                    None => eprintln!("cannot resolve {:?}", target),
                }
                None
            }
            Command::Memory(target, count) => {
                match self.resolve_target(&target) {
                    Some(address) => self.dump_memory(address, count.unwrap_or(4)),
                    None => eprintln!("cannot resolve {}", target),
                }
                None
            }
            Command::Hex => self.set_base(Base::Hex),
            Command::Dec => self.set_base(Base::Dec),
            Command::Oct => self.set_base(Base::Oct),
            Command::Bin => self.set_base(Base::Bin),
            Command::Status => {
                let settings = &self.settings;
                println!("auto-execute: {}", on_off(settings.auto_execute));
                println!("auto-dump:    {}", on_off(settings.auto_dump));
                println!("trace:        {}", on_off(settings.trace));
                println!("verbose:      {}", on_off(settings.verbose));
                println!("base:         {:?}", settings.base);
                println!(
                    "segment:      {}",
                    if self.assembler.writing_data() {
                        "data"
                    } else {
                        "text"
                    }
                );
                println!("text cursor:  {:#010x}", self.assembler.text_cursor());
                println!("data cursor:  {:#010x}", self.assembler.data_cursor());
                match self.paused_text_location {
                    Some(location) => println!("paused at:    {:#010x}", location),
                    None => println!("paused at:    -"),
                }
                None
            }
            Command::Help => {
                println!("{}", HELP);
                None
            }
            Command::About => {
                println!(
                    "mish {} - an interactive MIPS32 interpreter",
                    env!("CARGO_PKG_VERSION")
                );
                None
            }
            Command::Noop => None,
            Command::File(path) => {
                self.open_file(&path);
                None
            }
            Command::Exit => Some(0),
            Command::Invalid(line) => {
                eprintln!("invalid command {}", line);
                None
            }
        }
    }

    fn set_base(&mut self, base: Base) -> Option<i32> {
        self.settings.base = base;
        println!("base: {:?}", base);
        None
    }

    /// Reads a whole file as input. Auto-execution pauses first, so
    /// the file's instructions are assembled but not run until
    /// `:execute`.
    fn open_file(&mut self, path: &str) {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                eprintln!("cannot read {}: {}", path, err);
                return;
            }
        };
        self.pause(self.assembler.current_location());
        for line in contents.lines() {
            if let Some(code) = self.handle_line(line) {
                // An exit inside a file still terminates the process.
                std::process::exit(code);
            }
        }
    }

    /// Register value for a dump command; also accepts the three
    /// registers user code cannot name as operands.
    fn named_register_value(&self, name: &str) -> Option<Word> {
        let registers = self.processor.registers();
        match name {
            "pc" => Some(registers.pc()),
            "hi" => Some(registers.get(Register::HI)),
            "lo" => Some(registers.get(Register::LO)),
            _ => Register::from_str(name)
                .ok()
                .map(|register| registers.get(register)),
        }
    }

    /// Resolves a dump target: a register's value, a numeric address,
    /// or a label.
    fn resolve_target(&self, text: &str) -> Option<Address> {
        if text.starts_with('$') {
            return Register::from_str(text)
                .ok()
                .map(|register| self.processor.registers().get(register));
        }
        if let Some(hex) = text.strip_prefix("0x") {
            return u32::from_str_radix(hex, 16).ok();
        }
        if text.bytes().all(|b| b.is_ascii_digit()) {
            return text.parse().ok();
        }
        self.assembler.label_address(text)
    }

    fn print_instruction_line(&self, address: Address) {
        if let Some(instruction) = self.assembler.instruction_at(address) {
            println!(
                "{:#010x}  {:#010x}  {}",
                address,
                self.memory.read_word(address),
                instruction
            );
        }
    }

    fn dump_memory(&self, start: Address, words: u32) {
        for i in 0..words {
            let address = start.wrapping_add(i * constants::WORD_BYTES);
            let value = self.memory.read_word(address);
            let ascii: String = bits::split_word(value)
                .iter()
                .map(|byte| bits::printable(*byte))
                .collect();
            println!(
                "{:#010x}  {}  {}",
                address,
                format_word(value, self.settings.base),
                ascii
            );
        }
    }

    fn dump_registers(&self) {
        let registers = self.processor.registers();
        let rendered: Vec<String> = registers
            .gprs()
            .map(|(register, value)| {
                format!(
                    "{:>5} = {}",
                    register.to_string(),
                    format_word(value, self.settings.base)
                )
            })
            .collect();
        for row in rendered.chunks(4) {
            println!("{}", row.join("   "));
        }
        println!(
            "   pc = {}      hi = {}      lo = {}",
            format_word(registers.pc(), self.settings.base),
            format_word(registers.get(Register::HI), self.settings.base),
            format_word(registers.get(Register::LO), self.settings.base),
        );
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn format_word(value: Word, base: Base) -> String {
    match base {
        Base::Hex => format!("{:#010x}", value),
        Base::Dec => format!("{}", value as i32),
        Base::Oct => format!("{:#o}", value),
        Base::Bin => format!("{:#034b}", value),
    }
}

const HELP: &str = "\
commands:
  :autoexecute (:ae)            toggle running instructions as they assemble
  :execute (:e)                 resume from the paused location
  :trace (:t)                   toggle printing instructions before they run
  :verbose (:v)                 toggle printing parsed instructions
  :autodump (:ad)               toggle a register dump after each step
  :registerdump (:rd)           print the register file
  :register <reg> (:r)          print one register
  :labeldump (:ld)              print all labels
  :label <name> (:l)            print one label
  :unresolved (:u)              print unresolved references
  :instructions (:id)           print all stored instructions
  :instruction [at] [n] (:i)    print n instructions from an address/label
  :memory <at> [n] (:m)         print n words of memory
  :hex :dec :oct :bin           set the display base
  :status (:s)                  print settings and cursors
  :file <path> (:f)             read input from a file
  :noop (:n)                    do nothing
  :help (:h, :?)                this text
  :about                        version information
  :exit (:q)                    leave the interpreter";
