use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("I/O error while writing output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Writing the output was cancelled")]
    Cancelled,

    #[error("Cannot {operation}: no element is open")]
    NoOpenElement { operation: &'static str },

    #[error("Attribute '{name}' written after element content")]
    AttributeAfterContent { name: String },

    #[error("Attribute '{name}' written twice on one element")]
    DuplicateAttribute { name: String },

    #[error("Cannot start element '{name}': the document already has a root element")]
    SecondRoot { name: String },

    #[error("The base writer cannot be removed from the writer stack")]
    BaseWriter,
}
