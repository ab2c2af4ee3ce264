/// Result of a rewrite step: `Yes` when a new node was built, `No` when the
/// input node is handed back as-is.
#[derive(Debug, PartialEq, Clone)]
pub enum Transformed<T> {
    Yes(T),
    No(T),
}

impl<T> Transformed<T> {
    pub fn into_inner(self) -> T {
        match self {
            Transformed::Yes(node) | Transformed::No(node) => node,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Transformed::Yes(_))
    }

    pub fn as_inner(&self) -> &T {
        match self {
            Transformed::Yes(node) | Transformed::No(node) => node,
        }
    }
}
