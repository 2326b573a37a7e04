use bevy_ecs::prelude::Entity;
use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use std::fmt;

/// Extra arguments bound to a listener when it is registered.
pub type BoundArgs = SmallVec<[ArgValue; 4]>;

/// A single bound argument.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Entity(Entity),
    Vec2(Vec2),
    Vec3(Vec3),
}

impl ArgValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(v) => Some(*v),
            ArgValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<Entity> {
        match self {
            ArgValue::Entity(v) => Some(*v),
            _ => None,
        }
    }
}

// Boxed-value semantics: NaN equals NaN, no cross-variant coercion.
impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Bool(a), ArgValue::Bool(b)) => a == b,
            (ArgValue::Int(a), ArgValue::Int(b)) => a == b,
            (ArgValue::Float(a), ArgValue::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (ArgValue::Str(a), ArgValue::Str(b)) => a == b,
            (ArgValue::Entity(a), ArgValue::Entity(b)) => a == b,
            (ArgValue::Vec2(a), ArgValue::Vec2(b)) => a == b,
            (ArgValue::Vec3(a), ArgValue::Vec3(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(v) => write!(f, "{v}"),
            ArgValue::Int(v) => write!(f, "{v}"),
            ArgValue::Float(v) => write!(f, "{v}"),
            ArgValue::Str(v) => write!(f, "{v:?}"),
            ArgValue::Entity(v) => write!(f, "entity#{}", v.index()),
            ArgValue::Vec2(v) => write!(f, "({}, {})", v.x, v.y),
            ArgValue::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
        }
    }
}

/// Element-wise comparison; slices of different length never match.
pub fn args_equal(a: &[ArgValue], b: &[ArgValue]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(lhs, rhs)| lhs == rhs)
}

pub fn format_args_list(args: &[ArgValue]) -> String {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(value as i64)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(value as i64)
    }
}

impl From<f32> for ArgValue {
    fn from(value: f32) -> Self {
        ArgValue::Float(value as f64)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

impl From<Entity> for ArgValue {
    fn from(value: Entity) -> Self {
        ArgValue::Entity(value)
    }
}

impl From<Vec2> for ArgValue {
    fn from(value: Vec2) -> Self {
        ArgValue::Vec2(value)
    }
}

impl From<Vec3> for ArgValue {
    fn from(value: Vec3) -> Self {
        ArgValue::Vec3(value)
    }
}

/// Builds a [`BoundArgs`] list from anything convertible into [`ArgValue`].
///
/// ```
/// use scene_listener::args;
/// let bound = args![1, "door", true];
/// assert_eq!(bound.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::args::BoundArgs::new()
    };
    ($($value:expr),+ $(,)?) => {{
        let mut bound = $crate::args::BoundArgs::new();
        $(bound.push($crate::args::ArgValue::from($value));)+
        bound
    }};
}
