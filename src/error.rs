use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configuration could not be loaded or failed validation.
    #[display("invalid configuration")]
    Config,
    /// A local collaborator could not be created.
    #[display("could not set up {_0}")]
    Setup(#[error(not(source))] &'static str),
    /// The run stopped before the plan was drained.
    #[display("run aborted")]
    Run,
}
