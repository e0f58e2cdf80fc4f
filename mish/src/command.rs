//! The meta-command model: everything a `:`-prefixed line can mean.

/// A parsed meta-command. Unknown keywords, malformed arguments and
/// non-ASCII input all land in `Invalid`, which the driver reports
/// verbatim.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Command {
    AutoExecute,
    Execute,
    Trace,
    Verbose,
    RegisterDump,
    Register(String),
    AutoDump,
    LabelDump,
    Label(String),
    Unresolved,
    InstructionDump,
    Instruction(Option<String>, Option<u32>),
    Memory(String, Option<u32>),
    Hex,
    Dec,
    Oct,
    Bin,
    Status,
    Help,
    About,
    Noop,
    File(String),
    Exit,
    Invalid(String),
}

impl Command {
    /// Parses a line that starts with `:`.
    pub fn parse(line: &str) -> Command {
        let invalid = || Command::Invalid(line.to_string());

        if !line.is_ascii() {
            return invalid();
        }

        let mut tokens = line[1..].split_whitespace();
        let keyword = match tokens.next() {
            Some(keyword) => keyword.to_lowercase(),
            None => return invalid(),
        };
        let first = tokens.next();
        let second = tokens.next();
        if tokens.next().is_some() {
            return invalid();
        }

        let no_args = first.is_none();
        let command = match keyword.as_str() {
            "autoexecute" | "ae" if no_args => Command::AutoExecute,
            "execute" | "exec" | "ex" | "e" if no_args => Command::Execute,
            "trace" | "t" if no_args => Command::Trace,
            "verbose" | "v" if no_args => Command::Verbose,
            "registerdump" | "regdump" | "registers" | "regs" | "rd" if no_args => {
                Command::RegisterDump
            }
            "register" | "reg" | "r" => match (first, second) {
                (Some(name), None) => Command::Register(name.to_string()),
                _ => return invalid(),
            },
            "autodump" | "ad" if no_args => Command::AutoDump,
            "labeldump" | "labels" | "ld" if no_args => Command::LabelDump,
            "label" | "l" => match (first, second) {
                (Some(name), None) => Command::Label(name.to_string()),
                _ => return invalid(),
            },
            "unresolved" | "unres" | "u" if no_args => Command::Unresolved,
            "instructions" | "insts" | "instructiondump" | "instdump" | "id" if no_args => {
                Command::InstructionDump
            }
            "instruction" | "inst" | "i" => {
                let count = match second.map(parse_count) {
                    Some(Some(count)) => Some(count),
                    Some(None) => return invalid(),
                    None => None,
                };
                Command::Instruction(first.map(str::to_string), count)
            }
            "memory" | "mem" | "m" => match first {
                Some(target) => {
                    let count = match second.map(parse_count) {
                        Some(Some(count)) => Some(count),
                        Some(None) => return invalid(),
                        None => None,
                    };
                    Command::Memory(target.to_string(), count)
                }
                None => return invalid(),
            },
            "hex" if no_args => Command::Hex,
            "dec" if no_args => Command::Dec,
            "oct" if no_args => Command::Oct,
            "bin" if no_args => Command::Bin,
            "status" | "settings" | "s" if no_args => Command::Status,
            "help" | "commands" | "h" | "?" | "cmds" | "c" if no_args => Command::Help,
            "about" if no_args => Command::About,
            "noop" | "n" if no_args => Command::Noop,
            "file" | "f" | "use" | "usefile" | "openfile" | "open" | "o" => {
                match (first, second) {
                    (Some(path), None) => Command::File(path.to_string()),
                    _ => return invalid(),
                }
            }
            "exit" | "quit" | "q" if no_args => Command::Exit,
            _ => return invalid(),
        };

        command
    }
}

fn parse_count(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keywords_and_aliases() {
        assert_eq!(Command::parse(":autoexecute"), Command::AutoExecute);
        assert_eq!(Command::parse(":ae"), Command::AutoExecute);
        assert_eq!(Command::parse(":e"), Command::Execute);
        assert_eq!(Command::parse(":regs"), Command::RegisterDump);
        assert_eq!(Command::parse(":RD"), Command::RegisterDump);
        assert_eq!(Command::parse(":?"), Command::Help);
        assert_eq!(Command::parse(":quit"), Command::Exit);
        assert_eq!(Command::parse(":n"), Command::Noop);
    }

    #[test]
    fn argument_commands() {
        assert_eq!(
            Command::parse(":register $t0"),
            Command::Register("$t0".to_string())
        );
        assert_eq!(
            Command::parse(":l main"),
            Command::Label("main".to_string())
        );
        assert_eq!(
            Command::parse(":m $sp 8"),
            Command::Memory("$sp".to_string(), Some(8))
        );
        assert_eq!(
            Command::parse(":mem 0x10000000"),
            Command::Memory("0x10000000".to_string(), None)
        );
        assert_eq!(
            Command::parse(":i main 3"),
            Command::Instruction(Some("main".to_string()), Some(3))
        );
        assert_eq!(Command::parse(":inst"), Command::Instruction(None, None));
        assert_eq!(
            Command::parse(":file demo.asm"),
            Command::File("demo.asm".to_string())
        );
    }

    #[test]
    fn invalid_forms() {
        assert!(matches!(Command::parse(":bogus"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":register"), Command::Invalid(_)));
        assert!(matches!(
            Command::parse(":memory $sp 4 extra"),
            Command::Invalid(_)
        ));
        assert!(matches!(Command::parse(":exit now"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":exécute"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":m $sp zzz"), Command::Invalid(_)));
    }
}
