//! Bytecode opcodes for the stack VM
//!
//! Every instruction is one tag byte followed by a fixed operand layout.
//! The enumeration is closed: tags outside it are rejected by
//! [`Opcode::from_u8`], and the dispatch loop matches exhaustively.

/// Inline operand layout following an opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLayout {
    /// No inline operand
    None,
    /// 8-byte IEEE 754 double
    Double,
    /// 8-byte signed integer
    Int,
    /// 2-byte unsigned id (constant, slot, function or native)
    Id,
    /// Two 2-byte unsigned ids: context id, then slot id
    ContextSlot,
    /// 2-byte signed jump offset
    JumpOffset,
}

impl OperandLayout {
    /// Number of operand bytes following the opcode
    pub fn width(self) -> usize {
        match self {
            OperandLayout::None => 0,
            OperandLayout::Double | OperandLayout::Int => 8,
            OperandLayout::Id | OperandLayout::JumpOffset => 2,
            OperandLayout::ContextSlot => 4,
        }
    }
}

/// Bytecode opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Invalid instruction; executing it is fatal
    Invalid = 0,

    // Literals
    /// Push inline double
    DLoad,
    /// Push inline int
    ILoad,
    /// Push string constant by pool id
    SLoad,
    /// Push 0.0
    DLoad0,
    /// Push 0
    ILoad0,
    /// Push the empty string
    SLoad0,
    /// Push 1.0
    DLoad1,
    /// Push 1
    ILoad1,
    /// Push -1.0
    DLoadM1,
    /// Push -1
    ILoadM1,

    // Arithmetic
    /// lower + upper (doubles)
    DAdd,
    /// lower + upper (ints)
    IAdd,
    /// lower - upper (doubles)
    DSub,
    /// lower - upper (ints)
    ISub,
    /// lower * upper (doubles)
    DMul,
    /// lower * upper (ints)
    IMul,
    /// lower / upper (doubles)
    DDiv,
    /// lower / upper (ints, truncating)
    IDiv,
    /// lower % upper (ints, sign of lower)
    IMod,
    /// Negate double
    DNeg,
    /// Negate int
    INeg,
    /// Bitwise or
    IAOr,
    /// Bitwise and
    IAAnd,
    /// Bitwise xor
    IAXor,

    // Output
    /// Pop and print int
    IPrint,
    /// Pop and print double
    DPrint,
    /// Pop and print string
    SPrint,

    // Conversions
    /// Int to double
    I2D,
    /// Double to int, truncating toward zero
    D2I,
    /// String to int: 1 if non-empty, else 0
    S2I,

    // Stack shuffling
    /// Exchange the two topmost cells
    Swap,
    /// Discard the topmost cell
    Pop,

    // Cached local access (slots 0..3 of the top frame)
    /// Load double slot 0
    LoadDVar0,
    /// Load double slot 1
    LoadDVar1,
    /// Load double slot 2
    LoadDVar2,
    /// Load double slot 3
    LoadDVar3,
    /// Load int slot 0
    LoadIVar0,
    /// Load int slot 1
    LoadIVar1,
    /// Load int slot 2
    LoadIVar2,
    /// Load int slot 3
    LoadIVar3,
    /// Load string slot 0
    LoadSVar0,
    /// Load string slot 1
    LoadSVar1,
    /// Load string slot 2
    LoadSVar2,
    /// Load string slot 3
    LoadSVar3,
    /// Store double slot 0
    StoreDVar0,
    /// Store double slot 1
    StoreDVar1,
    /// Store double slot 2
    StoreDVar2,
    /// Store double slot 3
    StoreDVar3,
    /// Store int slot 0
    StoreIVar0,
    /// Store int slot 1
    StoreIVar1,
    /// Store int slot 2
    StoreIVar2,
    /// Store int slot 3
    StoreIVar3,
    /// Store string slot 0
    StoreSVar0,
    /// Store string slot 1
    StoreSVar1,
    /// Store string slot 2
    StoreSVar2,
    /// Store string slot 3
    StoreSVar3,

    // Generic local access
    /// Load double from inline slot id
    LoadDVar,
    /// Load int from inline slot id
    LoadIVar,
    /// Load string from inline slot id
    LoadSVar,
    /// Store double to inline slot id
    StoreDVar,
    /// Store int to inline slot id
    StoreIVar,
    /// Store string to inline slot id
    StoreSVar,

    // Context-qualified access
    /// Load double from (context, slot)
    LoadCtxDVar,
    /// Load int from (context, slot)
    LoadCtxIVar,
    /// Load string from (context, slot)
    LoadCtxSVar,
    /// Store double to (context, slot)
    StoreCtxDVar,
    /// Store int to (context, slot)
    StoreCtxIVar,
    /// Store string to (context, slot)
    StoreCtxSVar,

    // Comparison
    /// Non-destructive double compare, pushes -1/0/1
    DCmp,
    /// Non-destructive int compare, pushes -1/0/1
    ICmp,

    // Control flow
    /// Jump always
    Ja,
    /// Jump if lower != upper
    IfICmpNe,
    /// Jump if lower == upper
    IfICmpE,
    /// Jump if lower > upper
    IfICmpG,
    /// Jump if lower >= upper
    IfICmpGe,
    /// Jump if lower < upper
    IfICmpL,
    /// Jump if lower <= upper
    IfICmpLe,
    /// Log the top cell without removing it
    Dump,
    /// Stop the whole program
    Stop,
    /// Call bytecode function by id
    Call,
    /// Call native binding by id
    CallNative,
    /// Return from the current function
    Return,
    /// Debugger breakpoint
    Break,
}

/// Number of defined opcodes; tags at or above this are unrecognized
pub const OPCODE_COUNT: usize = 84;

const ALL: [Opcode; OPCODE_COUNT] = {
    use Opcode::*;
    [
        Invalid, DLoad, ILoad, SLoad, DLoad0, ILoad0, SLoad0, DLoad1, ILoad1, DLoadM1, ILoadM1,
        DAdd, IAdd, DSub, ISub, DMul, IMul, DDiv, IDiv, IMod, DNeg, INeg, IAOr, IAAnd, IAXor,
        IPrint, DPrint, SPrint, I2D, D2I, S2I, Swap, Pop, LoadDVar0, LoadDVar1, LoadDVar2,
        LoadDVar3, LoadIVar0, LoadIVar1, LoadIVar2, LoadIVar3, LoadSVar0, LoadSVar1, LoadSVar2,
        LoadSVar3, StoreDVar0, StoreDVar1, StoreDVar2, StoreDVar3, StoreIVar0, StoreIVar1,
        StoreIVar2, StoreIVar3, StoreSVar0, StoreSVar1, StoreSVar2, StoreSVar3, LoadDVar,
        LoadIVar, LoadSVar, StoreDVar, StoreIVar, StoreSVar, LoadCtxDVar, LoadCtxIVar,
        LoadCtxSVar, StoreCtxDVar, StoreCtxIVar, StoreCtxSVar, DCmp, ICmp, Ja, IfICmpNe,
        IfICmpE, IfICmpG, IfICmpGe, IfICmpL, IfICmpLe, Dump, Stop, Call, CallNative, Return,
        Break,
    ]
};

impl Opcode {
    /// Decode an opcode tag, returning `None` for unrecognized tags
    pub fn from_u8(tag: u8) -> Option<Self> {
        ALL.get(tag as usize).copied()
    }

    /// Encoded tag byte
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Layout of the inline operand following this opcode
    pub fn layout(self) -> OperandLayout {
        use Opcode::*;
        match self {
            DLoad => OperandLayout::Double,
            ILoad => OperandLayout::Int,
            SLoad | LoadDVar | LoadIVar | LoadSVar | StoreDVar | StoreIVar | StoreSVar | Call
            | CallNative => OperandLayout::Id,
            LoadCtxDVar | LoadCtxIVar | LoadCtxSVar | StoreCtxDVar | StoreCtxIVar
            | StoreCtxSVar => OperandLayout::ContextSlot,
            Ja | IfICmpNe | IfICmpE | IfICmpG | IfICmpGe | IfICmpL | IfICmpLe => {
                OperandLayout::JumpOffset
            }
            _ => OperandLayout::None,
        }
    }

    /// Total encoded length: tag byte plus operand bytes
    pub fn length(self) -> usize {
        1 + self.layout().width()
    }

    /// Upper-case mnemonic
    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Invalid => "INVALID",
            DLoad => "DLOAD",
            ILoad => "ILOAD",
            SLoad => "SLOAD",
            DLoad0 => "DLOAD0",
            ILoad0 => "ILOAD0",
            SLoad0 => "SLOAD0",
            DLoad1 => "DLOAD1",
            ILoad1 => "ILOAD1",
            DLoadM1 => "DLOADM1",
            ILoadM1 => "ILOADM1",
            DAdd => "DADD",
            IAdd => "IADD",
            DSub => "DSUB",
            ISub => "ISUB",
            DMul => "DMUL",
            IMul => "IMUL",
            DDiv => "DDIV",
            IDiv => "IDIV",
            IMod => "IMOD",
            DNeg => "DNEG",
            INeg => "INEG",
            IAOr => "IAOR",
            IAAnd => "IAAND",
            IAXor => "IAXOR",
            IPrint => "IPRINT",
            DPrint => "DPRINT",
            SPrint => "SPRINT",
            I2D => "I2D",
            D2I => "D2I",
            S2I => "S2I",
            Swap => "SWAP",
            Pop => "POP",
            LoadDVar0 => "LOADDVAR0",
            LoadDVar1 => "LOADDVAR1",
            LoadDVar2 => "LOADDVAR2",
            LoadDVar3 => "LOADDVAR3",
            LoadIVar0 => "LOADIVAR0",
            LoadIVar1 => "LOADIVAR1",
            LoadIVar2 => "LOADIVAR2",
            LoadIVar3 => "LOADIVAR3",
            LoadSVar0 => "LOADSVAR0",
            LoadSVar1 => "LOADSVAR1",
            LoadSVar2 => "LOADSVAR2",
            LoadSVar3 => "LOADSVAR3",
            StoreDVar0 => "STOREDVAR0",
            StoreDVar1 => "STOREDVAR1",
            StoreDVar2 => "STOREDVAR2",
            StoreDVar3 => "STOREDVAR3",
            StoreIVar0 => "STOREIVAR0",
            StoreIVar1 => "STOREIVAR1",
            StoreIVar2 => "STOREIVAR2",
            StoreIVar3 => "STOREIVAR3",
            StoreSVar0 => "STORESVAR0",
            StoreSVar1 => "STORESVAR1",
            StoreSVar2 => "STORESVAR2",
            StoreSVar3 => "STORESVAR3",
            LoadDVar => "LOADDVAR",
            LoadIVar => "LOADIVAR",
            LoadSVar => "LOADSVAR",
            StoreDVar => "STOREDVAR",
            StoreIVar => "STOREIVAR",
            StoreSVar => "STORESVAR",
            LoadCtxDVar => "LOADCTXDVAR",
            LoadCtxIVar => "LOADCTXIVAR",
            LoadCtxSVar => "LOADCTXSVAR",
            StoreCtxDVar => "STORECTXDVAR",
            StoreCtxIVar => "STORECTXIVAR",
            StoreCtxSVar => "STORECTXSVAR",
            DCmp => "DCMP",
            ICmp => "ICMP",
            Ja => "JA",
            IfICmpNe => "IFICMPNE",
            IfICmpE => "IFICMPE",
            IfICmpG => "IFICMPG",
            IfICmpGe => "IFICMPGE",
            IfICmpL => "IFICMPL",
            IfICmpLe => "IFICMPLE",
            Dump => "DUMP",
            Stop => "STOP",
            Call => "CALL",
            CallNative => "CALLNATIVE",
            Return => "RETURN",
            Break => "BREAK",
        }
    }

    /// Check if this opcode is a jump (conditional or not)
    pub fn is_jump(self) -> bool {
        self.layout() == OperandLayout::JumpOffset
    }

    /// Check if this opcode ends the current function or the program
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Return | Opcode::Stop | Opcode::Invalid)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
