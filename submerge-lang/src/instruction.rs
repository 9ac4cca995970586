use serde::{Deserialize, Serialize};

/// One parsed line of an instruction script. Transaction ids and item ids
/// are kept as opaque strings; `v` and `s` arguments are integers.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Instruction {
    Begin(String),
    Read(String, String),
    Write(String, String, i64),
    End(String),
    Fail(u32),
    Recover(u32),
    Dump,
}
