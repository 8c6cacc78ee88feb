use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("rendering failed")]
    Render,
    #[display("could not build response")]
    Response,
    #[display("I/O error")]
    Io,
}
