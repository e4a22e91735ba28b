#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("enum name \"{name}\" is ambiguous, it could be any of {}", candidates.join(", "))]
    AmbiguousEnum { name: String, candidates: Vec<String> },
    #[error("class \"{0}\" is declared more than once")]
    DuplicateClass(String),
    #[error("Failed to translate class \"{name}\"")]
    TranslateClass {
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("Failed to translate function \"{name}\"")]
    TranslateFunction {
        name: String,
        #[source]
        source: Box<Error>,
    },
}
