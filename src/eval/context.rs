use serde_json::Value;

static NULL: Value = Value::Null;

/// Resolution context for predicate evaluation: the current payload plus
/// an optional previous revision of the same document.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    payload: &'a Value,
    previous: Option<&'a Value>,
}

impl<'a> EvalContext<'a> {
    pub fn new(payload: &'a Value, previous: Option<&'a Value>) -> Self {
        Self { payload, previous }
    }

    /// Resolve a dotted path against the current payload. Missing keys and
    /// non-object intermediate values resolve to null.
    pub fn get(&self, path: &str) -> &'a Value {
        resolve_path(self.payload, path)
    }

    /// Resolve a dotted path against the previous payload, or null when no
    /// previous payload was supplied.
    pub fn previous(&self, path: &str) -> &'a Value {
        match self.previous {
            Some(previous) => resolve_path(previous, path),
            None => &NULL,
        }
    }

    /// Whether a previous payload was supplied at all. The `changed`
    /// operator treats a first submission as unchanged.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Walk `root` along the `.`-separated segments of `path`.
pub(crate) fn resolve_path<'v>(root: &'v Value, path: &str) -> &'v Value {
    let mut current = root;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(segment).unwrap_or(&NULL),
            _ => return &NULL,
        }
    }
    current
}
