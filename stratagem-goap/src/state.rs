use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Symbolic value stored at a world-state key.
///
/// The domain is deliberately float-free: values hash and compare
/// structurally, which lets goal states key the planner's visited set
/// directly. Hosts that need continuous quantities keep them outside the
/// symbolic layer and expose discretized facts here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// "No value yet": a declared key before anything was observed.
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Opaque host handle (entity id, object key). The core never looks
    /// inside it.
    Handle(u64),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{}", s),
            Value::Handle(h) => write!(f, "#{}", h),
        }
    }
}

/// A partial world state: the (key, demanded value) pairs a goal declares,
/// and the snapshot a plan step carries. Values here are always concrete;
/// the sentinels below exist only in action declarations.
pub type GoalState = BTreeMap<String, Value>;

/// Declared effect value of an action.
///
/// `Any` means the action can produce whatever value the search currently
/// demands for that key; the demanded value is bound into the step snapshot
/// at expansion time and written back on commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectExpr {
    Value(Value),
    Any,
}

impl From<Value> for EffectExpr {
    fn from(v: Value) -> Self {
        EffectExpr::Value(v)
    }
}

impl From<bool> for EffectExpr {
    fn from(b: bool) -> Self {
        EffectExpr::Value(Value::Bool(b))
    }
}

impl From<i64> for EffectExpr {
    fn from(i: i64) -> Self {
        EffectExpr::Value(Value::Int(i))
    }
}

impl From<&str> for EffectExpr {
    fn from(s: &str) -> Self {
        EffectExpr::Value(Value::Str(s.to_string()))
    }
}

/// Declared precondition value of an action.
///
/// `Ref(k)` forwards the value demanded of key `k` in the goal state being
/// expanded, so one precondition can depend on a binding produced for
/// another key in the same expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrecondExpr {
    Value(Value),
    Ref(String),
}

impl PrecondExpr {
    /// Resolve to the concrete required value, given the snapshot of the
    /// goal state this precondition is evaluated under. `None` when a `Ref`
    /// points at a key the snapshot does not demand.
    pub fn resolve<'a>(&'a self, snapshot: &'a GoalState) -> Option<&'a Value> {
        match self {
            PrecondExpr::Value(v) => Some(v),
            PrecondExpr::Ref(key) => snapshot.get(key),
        }
    }
}

impl From<Value> for PrecondExpr {
    fn from(v: Value) -> Self {
        PrecondExpr::Value(v)
    }
}

impl From<bool> for PrecondExpr {
    fn from(b: bool) -> Self {
        PrecondExpr::Value(Value::Bool(b))
    }
}

impl From<i64> for PrecondExpr {
    fn from(i: i64) -> Self {
        PrecondExpr::Value(Value::Int(i))
    }
}

impl From<&str> for PrecondExpr {
    fn from(s: &str) -> Self {
        PrecondExpr::Value(Value::Str(s.to_string()))
    }
}

/// Live world state: a deterministic key/value store over the symbolic
/// domain. Keys are declared by the host at setup; the core only reads and
/// writes values at existing keys (the planner validates this once, at
/// construction).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldState {
    state: BTreeMap<String, Value>,
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            state: BTreeMap::new(),
        }
    }

    /// Builder-style declaration of a key, for host setup code.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.state.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// True when every demanded pair holds here, under structural equality.
    pub fn satisfies(&self, conditions: &GoalState) -> bool {
        conditions
            .iter()
            .all(|(key, demanded)| self.state.get(key) == Some(demanded))
    }

    /// Iterator over declared keys in deterministic (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.state.iter()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.state.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}
