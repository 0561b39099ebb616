use thiserror::Error;

pub type PcResult<T> = Result<T, PcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PcError {
    #[error("Probe index out of range: {index} (probes={len})")]
    ProbeIndex { index: usize, len: usize },

    #[error("Unknown temperature unit: {label}")]
    UnknownUnit { label: String },
}
