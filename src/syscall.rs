use crate::memory::Memory;
use crate::processor::{Exec, ExecError};
use crate::registers::{Register, RegisterFile};
use crate::Word;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// System calls, selected by the value in `$v0`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Syscall {
    PrintInt,
    PrintString,
    ReadInt,
    ReadString,
    Exit,
    PrintChar,
    ReadChar,
    Exit2,
    Time,
    Sleep,
    PrintHex,
    PrintBin,
    PrintUint,
}

impl Syscall {
    pub fn from_code(code: Word) -> Option<Syscall> {
        match code {
            1 => Some(Syscall::PrintInt),
            4 => Some(Syscall::PrintString),
            5 => Some(Syscall::ReadInt),
            8 => Some(Syscall::ReadString),
            10 => Some(Syscall::Exit),
            11 => Some(Syscall::PrintChar),
            12 => Some(Syscall::ReadChar),
            17 => Some(Syscall::Exit2),
            30 => Some(Syscall::Time),
            32 => Some(Syscall::Sleep),
            34 => Some(Syscall::PrintHex),
            35 => Some(Syscall::PrintBin),
            36 => Some(Syscall::PrintUint),
            _ => None,
        }
    }
}

/// The world a syscall touches. The interactive driver uses [`StdIo`];
/// tests inject [`ScriptedIo`] to script stdin and capture stdout.
pub trait SysIo {
    fn print(&mut self, text: &str);

    /// Reads one line, without its trailing newline.
    fn read_line(&mut self) -> String;

    fn sleep(&mut self, millis: Word);

    fn time_millis(&mut self) -> u64;
}

/// Process stdin/stdout. The input stream is the same one the
/// interactive prompt reads from; whichever side asks first gets the
/// next line.
pub struct StdIo;

impl SysIo for StdIo {
    fn print(&mut self, text: &str) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = handle.write_all(text.as_bytes());
        let _ = handle.flush();
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return String::new();
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        line
    }

    fn sleep(&mut self, millis: Word) {
        thread::sleep(Duration::from_millis(u64::from(millis)));
    }

    fn time_millis(&mut self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Scripted I/O for tests: queued input lines, captured output, a
/// fixed clock, no sleeping.
#[derive(Default)]
pub struct ScriptedIo {
    input: VecDeque<String>,
    output: String,
    now_millis: u64,
    slept_millis: u64,
}

impl ScriptedIo {
    pub fn new() -> ScriptedIo {
        Default::default()
    }

    pub fn with_input(lines: &[&str]) -> ScriptedIo {
        ScriptedIo {
            input: lines.iter().map(|line| line.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn slept_millis(&self) -> u64 {
        self.slept_millis
    }
}

impl SysIo for ScriptedIo {
    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn read_line(&mut self) -> String {
        self.input.pop_front().unwrap_or_default()
    }

    fn sleep(&mut self, millis: Word) {
        self.slept_millis += u64::from(millis);
    }

    fn time_millis(&mut self) -> u64 {
        self.now_millis
    }
}

/// Runs the syscall selected by `$v0`.
pub fn dispatch(
    registers: &mut RegisterFile,
    memory: &mut Memory,
    io: &mut dyn SysIo,
) -> Result<Exec, ExecError> {
    let code = registers.get(Register::V0);
    let call = Syscall::from_code(code).ok_or(ExecError::UnknownSyscall(code))?;
    let a0 = registers.get(Register::A0);

    match call {
        Syscall::PrintInt => io.print(&(a0 as i32).to_string()),
        Syscall::PrintString => {
            let mut text = String::new();
            let mut address = a0;
            loop {
                let byte = memory.read_byte(address);
                if byte == 0 {
                    break;
                }
                text.push(byte as char);
                address = address.wrapping_add(1);
            }
            io.print(&text);
        }
        Syscall::ReadInt => {
            let line = io.read_line();
            let value = line.trim().parse::<i32>().unwrap_or(0);
            registers.set(Register::V0, value as Word);
        }
        Syscall::ReadString => {
            let capacity = registers.get(Register::A1);
            if capacity > 0 {
                let line = io.read_line();
                let mut address = a0;
                for byte in line.bytes().take((capacity - 1) as usize) {
                    memory.write_byte(address, byte);
                    address = address.wrapping_add(1);
                }
                memory.write_byte(address, 0);
            }
        }
        Syscall::Exit => return Ok(Exec::Exit(0)),
        Syscall::PrintChar => io.print(&((a0 & 0xff) as u8 as char).to_string()),
        Syscall::ReadChar => {
            let line = io.read_line();
            let value = line.bytes().next().unwrap_or(0);
            registers.set(Register::V0, Word::from(value));
        }
        Syscall::Exit2 => return Ok(Exec::Exit(a0 as i32)),
        Syscall::Time => {
            let millis = io.time_millis();
            registers.set(Register::A0, millis as Word);
            registers.set(Register::A1, (millis >> 32) as Word);
        }
        Syscall::Sleep => io.sleep(a0),
        Syscall::PrintHex => io.print(&format!("{:#010x}", a0)),
        Syscall::PrintBin => io.print(&format!("{:032b}", a0)),
        Syscall::PrintUint => io.print(&a0.to_string()),
    }

    Ok(Exec::Next)
}
