//! Incremental assembler state: label and instruction maps, the
//! unresolved-reference map, and the text/data segment cursors.

use crate::error::Error;
use crate::Result;
use mips::{constants, encode, Address, Directive, Instruction, InstructionKind, LabelMap, Memory};
use std::collections::HashMap;

/// What committing one parsed line did, for the driver.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Commit {
    /// Location of the line's first instruction.
    pub location: Address,
    /// Whether anything runnable was stored.
    pub executable: bool,
    /// Whether the line introduced a reference to a label that is not
    /// defined yet. The interactive driver pauses auto-execution on
    /// this.
    pub unresolved: bool,
}

pub struct Assembler {
    labels: LabelMap,
    instructions: HashMap<Address, Instruction>,
    unresolved: HashMap<String, Vec<Address>>,
    text_cursor: Address,
    data_cursor: Address,
    writing_data: bool,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler {
            labels: LabelMap::new(),
            instructions: HashMap::new(),
            unresolved: HashMap::new(),
            text_cursor: constants::TEXT_BASE,
            data_cursor: constants::DATA_BASE,
            writing_data: false,
        }
    }

    /// The address the next parsed line will occupy.
    pub fn current_location(&self) -> Address {
        if self.writing_data {
            self.data_cursor
        } else {
            self.text_cursor
        }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn label_address(&self, name: &str) -> Option<Address> {
        self.labels.get(name).copied()
    }

    pub fn instruction_at(&self, address: Address) -> Option<&Instruction> {
        self.instructions.get(&address)
    }

    /// All stored instructions in address order.
    pub fn sorted_instructions(&self) -> Vec<&Instruction> {
        let mut all: Vec<&Instruction> = self.instructions.values().collect();
        all.sort_by_key(|instruction| instruction.location());
        all
    }

    pub fn unresolved(&self) -> &HashMap<String, Vec<Address>> {
        &self.unresolved
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    pub fn writing_data(&self) -> bool {
        self.writing_data
    }

    pub fn text_cursor(&self) -> Address {
        self.text_cursor
    }

    pub fn data_cursor(&self) -> Address {
        self.data_cursor
    }

    /// Commits one parsed line.
    ///
    /// Labels are recorded first (rejecting the whole batch on a
    /// duplicate), directives run immediately against the cursors and
    /// memory, and executable instructions are stored and encoded into
    /// memory at their location. Storing over a label-only line merges
    /// its labels and comment; storing over real code is refused.
    pub fn commit(&mut self, batch: Vec<Instruction>, memory: &mut Memory) -> Result<Commit> {
        let location = match batch.first() {
            Some(first) => first.location(),
            None => return Ok(Commit {
                location: self.current_location(),
                executable: false,
                unresolved: false,
            }),
        };

        for instruction in &batch {
            for label in instruction.labels() {
                if self.labels.contains_key(label) {
                    return Err(Error::DuplicateLabel(label.clone()));
                }
            }
            if instruction.is_executable() {
                if let Some(existing) = self.instructions.get(&instruction.location()) {
                    if existing.is_executable() {
                        return Err(Error::OverwriteInstruction(instruction.location()));
                    }
                }
            }
        }

        let mut executable = false;
        let mut unresolved = false;

        for mut instruction in batch {
            for label in instruction.labels().to_vec() {
                self.define(label, instruction.location(), memory);
            }

            match instruction.kind() {
                InstructionKind::Directive(directive) => {
                    let directive = directive.clone();
                    if let Some(existing) = self.instructions.get(&instruction.location()) {
                        instruction.merge_context(existing);
                    }
                    self.run_directive(&directive, memory);
                    self.instructions.insert(instruction.location(), instruction);
                }
                InstructionKind::NonExecutable => {
                    if let Some(existing) = self.instructions.get(&instruction.location()) {
                        instruction.merge_context(existing);
                    }
                    self.instructions.insert(instruction.location(), instruction);
                }
                _ => {
                    if let Some(existing) = self.instructions.get(&instruction.location()) {
                        instruction.merge_context(existing);
                    }
                    if let Some(label) = instruction.referenced_label() {
                        if !self.labels.contains_key(label) {
                            self.unresolved
                                .entry(label.to_string())
                                .or_insert_with(Vec::new)
                                .push(instruction.location());
                            unresolved = true;
                        }
                    }
                    memory.write_word(instruction.location(), encode(&instruction, &self.labels));
                    let next = instruction
                        .location()
                        .wrapping_add(instruction.pc_increment());
                    self.set_cursor(next);
                    executable = true;
                    self.instructions.insert(instruction.location(), instruction);
                }
            }
        }

        Ok(Commit {
            location,
            executable,
            unresolved,
        })
    }

    /// Defines a label and settles everything that was waiting for it:
    /// the pending list is dropped and the waiting instructions'
    /// encodings are patched now that the target is known.
    fn define(&mut self, label: String, address: Address, memory: &mut Memory) {
        let drained = self.unresolved.remove(&label);
        self.labels.insert(label, address);
        if let Some(waiters) = drained {
            for location in waiters {
                if let Some(instruction) = self.instructions.get(&location) {
                    memory.write_word(location, encode(instruction, &self.labels));
                }
            }
        }
    }

    fn run_directive(&mut self, directive: &Directive, memory: &mut Memory) {
        match directive {
            Directive::Text => self.writing_data = false,
            Directive::Data => self.writing_data = true,
            // Recognized for compatibility; a single-file interpreter
            // has no external symbols to export.
            Directive::Global(_) => {}
            Directive::Align(factor) => {
                let alignment = 1u32 << factor;
                let offset = self.current_location() % alignment;
                if offset != 0 {
                    self.advance(alignment - offset);
                }
            }
            Directive::Space(size) => self.advance(*size),
            Directive::Byte(values) => {
                for value in values {
                    memory.write_byte(self.current_location(), *value);
                    self.advance(constants::BYTE_BYTES);
                }
            }
            Directive::Half(values) => {
                for value in values {
                    memory.write_half(self.current_location(), *value);
                    self.advance(constants::HALF_BYTES);
                }
            }
            Directive::Word(values) => {
                for value in values {
                    memory.write_word(self.current_location(), *value);
                    self.advance(constants::WORD_BYTES);
                }
            }
            Directive::Ascii(bytes) => self.write_bytes(bytes, memory),
            Directive::Asciiz(bytes) => {
                self.write_bytes(bytes, memory);
                memory.write_byte(self.current_location(), 0);
                self.advance(constants::BYTE_BYTES);
            }
        }
    }

    fn write_bytes(&mut self, bytes: &[u8], memory: &mut Memory) {
        for byte in bytes {
            memory.write_byte(self.current_location(), *byte);
            self.advance(constants::BYTE_BYTES);
        }
    }

    fn advance(&mut self, amount: u32) {
        let next = self.current_location().wrapping_add(amount);
        self.set_cursor(next);
    }

    fn set_cursor(&mut self, address: Address) {
        if self.writing_data {
            self.data_cursor = address;
        } else {
            self.text_cursor = address;
        }
    }
}

impl Default for Assembler {
    fn default() -> Assembler {
        Assembler::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_line;

    fn commit_line(
        assembler: &mut Assembler,
        memory: &mut Memory,
        line: &str,
    ) -> Result<Commit> {
        let batch = parse_line(line, assembler.current_location())?;
        assembler.commit(batch, memory)
    }

    #[test]
    fn labels_map_to_line_locations() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, "start: addi $t0, $t0, 1").unwrap();
        commit_line(&mut assembler, &mut memory, "next: addi $t0, $t0, 2").unwrap();

        assert_eq!(assembler.label_address("start"), Some(constants::TEXT_BASE));
        assert_eq!(
            assembler.label_address("next"),
            Some(constants::TEXT_BASE + 4)
        );
    }

    #[test]
    fn duplicate_label_rejects_line_and_keeps_mapping() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, "here: addi $t0, $t0, 1").unwrap();
        let err = commit_line(&mut assembler, &mut memory, "here: addi $t1, $t1, 1");
        assert_eq!(err, Err(Error::DuplicateLabel("here".to_string())));

        assert_eq!(assembler.label_address("here"), Some(constants::TEXT_BASE));
        assert!(assembler.instruction_at(constants::TEXT_BASE + 4).is_none());
    }

    #[test]
    fn encodings_are_written_at_locations() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, "add $t2, $t0, $t1").unwrap();
        assert_eq!(memory.read_word(constants::TEXT_BASE), 0x0109_5020);
    }

    #[test]
    fn forward_reference_is_tracked_and_settled() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        let commit = commit_line(&mut assembler, &mut memory, "j later").unwrap();
        assert!(commit.unresolved);
        assert!(assembler.has_unresolved());
        // Unencodable until the label exists.
        assert_eq!(memory.read_word(constants::TEXT_BASE), constants::UNENCODED);

        let commit =
            commit_line(&mut assembler, &mut memory, "later: addi $t0, $t0, 1").unwrap();
        assert!(!commit.unresolved);
        assert!(!assembler.has_unresolved());
        // The jump's encoding is patched once the target is known.
        assert_eq!(
            memory.read_word(constants::TEXT_BASE),
            0x0800_0000 | ((constants::TEXT_BASE + 4) >> 2)
        );
    }

    #[test]
    fn backward_reference_needs_no_tracking() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, "loop: addi $t0, $t0, 1").unwrap();
        let commit = commit_line(&mut assembler, &mut memory, "bne $t0, $t1, loop").unwrap();
        assert!(!commit.unresolved);
        assert!(!assembler.has_unresolved());
    }

    #[test]
    fn label_only_line_merges_into_next_instruction() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        let commit = commit_line(&mut assembler, &mut memory, "loop:").unwrap();
        assert!(!commit.executable);

        commit_line(&mut assembler, &mut memory, "addi $t0, $t0, 1").unwrap();
        let stored = assembler.instruction_at(constants::TEXT_BASE).unwrap();
        assert!(stored.is_executable());
        assert_eq!(stored.labels(), ["loop".to_string()]);
        assert_eq!(assembler.label_address("loop"), Some(constants::TEXT_BASE));
    }

    #[test]
    fn segment_switching_moves_the_cursor() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        assert_eq!(assembler.current_location(), constants::TEXT_BASE);
        commit_line(&mut assembler, &mut memory, ".data").unwrap();
        assert_eq!(assembler.current_location(), constants::DATA_BASE);
        commit_line(&mut assembler, &mut memory, ".word 7").unwrap();
        assert_eq!(assembler.current_location(), constants::DATA_BASE + 4);
        commit_line(&mut assembler, &mut memory, ".text").unwrap();
        assert_eq!(assembler.current_location(), constants::TEXT_BASE);
        assert_eq!(memory.read_word(constants::DATA_BASE), 7);
    }

    #[test]
    fn asciiz_writes_bytes_and_terminator() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, ".data").unwrap();
        commit_line(&mut assembler, &mut memory, "msg: .asciiz \"hi\\n\"").unwrap();

        assert_eq!(assembler.label_address("msg"), Some(constants::DATA_BASE));
        assert_eq!(memory.read_byte(constants::DATA_BASE), 0x68);
        assert_eq!(memory.read_byte(constants::DATA_BASE + 1), 0x69);
        assert_eq!(memory.read_byte(constants::DATA_BASE + 2), 0x0a);
        assert_eq!(memory.read_byte(constants::DATA_BASE + 3), 0x00);
        assert_eq!(assembler.current_location(), constants::DATA_BASE + 4);
    }

    #[test]
    fn ascii_advances_without_terminator() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, ".data").unwrap();
        commit_line(&mut assembler, &mut memory, ".ascii \"ab\"").unwrap();
        assert_eq!(assembler.current_location(), constants::DATA_BASE + 2);
    }

    #[test]
    fn align_rounds_the_cursor_up() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, ".data").unwrap();
        commit_line(&mut assembler, &mut memory, ".byte 1").unwrap();
        commit_line(&mut assembler, &mut memory, ".align 2").unwrap();
        assert_eq!(assembler.current_location(), constants::DATA_BASE + 4);
        // Already aligned: no movement.
        commit_line(&mut assembler, &mut memory, ".align 2").unwrap();
        assert_eq!(assembler.current_location(), constants::DATA_BASE + 4);
    }

    #[test]
    fn space_reserves_bytes() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, ".data").unwrap();
        commit_line(&mut assembler, &mut memory, ".space 10").unwrap();
        assert_eq!(assembler.current_location(), constants::DATA_BASE + 10);
    }

    #[test]
    fn half_values_are_big_endian() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, ".data").unwrap();
        commit_line(&mut assembler, &mut memory, ".half 0x1234, -2").unwrap();
        assert_eq!(memory.read_byte(constants::DATA_BASE), 0x12);
        assert_eq!(memory.read_byte(constants::DATA_BASE + 1), 0x34);
        assert_eq!(memory.read_byte(constants::DATA_BASE + 2), 0xff);
        assert_eq!(memory.read_byte(constants::DATA_BASE + 3), 0xfe);
    }

    #[test]
    fn pseudo_expansion_advances_past_every_simple() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, "mul $t0, $t1, 5").unwrap();
        assert_eq!(assembler.current_location(), constants::TEXT_BASE + 12);
        assert!(assembler.instruction_at(constants::TEXT_BASE).is_some());
        assert!(assembler.instruction_at(constants::TEXT_BASE + 4).is_some());
        assert!(assembler.instruction_at(constants::TEXT_BASE + 8).is_some());
    }

    #[test]
    fn globl_is_recognized_without_effect() {
        let mut assembler = Assembler::new();
        let mut memory = Memory::new();

        commit_line(&mut assembler, &mut memory, ".globl main").unwrap();
        assert_eq!(assembler.current_location(), constants::TEXT_BASE);
        assert_eq!(assembler.label_address("main"), None);
    }
}
