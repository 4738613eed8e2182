//! Bindings between parsed arguments and host storage.
//!
//! The command model stays plain data; a [`CommandLine`](crate::CommandLine)
//! keeps a [`Binding`] per argument key and pushes every converted value
//! through it. [`FieldBinding`] targets a field of a shared host struct,
//! [`ValueCell`] is a standalone slot.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::{FromValue, IntoValue, Value};

/// Failure moving a value into or out of host storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("expected {target}, got {found}")]
    TypeMismatch {
        target: &'static str,
        found: &'static str,
    },

    #[error("{value} does not fit in {target}")]
    OutOfRange { target: &'static str, value: String },

    #[error("no argument named '{0}'")]
    UnknownArgument(String),
}

/// Get/set access to the storage behind one argument.
///
/// `set` receives the full accumulated value for the argument: the single
/// value of a scalar, or the whole list/map of a container.
pub trait Binding {
    /// Current value, if any. Used by boolean toggling.
    fn get(&self) -> Option<Value>;

    /// Stores a value.
    fn set(&mut self, value: Value) -> Result<(), BindingError>;
}

/// Binds to one field of a shared host struct.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use command_grammar_engine::{Binding, FieldBinding, Value};
///
/// #[derive(Default)]
/// struct Options {
///     count: u32,
/// }
///
/// let host = Rc::new(RefCell::new(Options::default()));
/// let mut count = FieldBinding::new(&host, |o: &mut Options| &mut o.count);
/// count.set(Value::Int(3)).unwrap();
/// assert_eq!(host.borrow().count, 3);
/// ```
pub struct FieldBinding<H, T> {
    host: Rc<RefCell<H>>,
    field: fn(&mut H) -> &mut T,
}

impl<H, T> FieldBinding<H, T> {
    pub fn new(host: &Rc<RefCell<H>>, field: fn(&mut H) -> &mut T) -> Self {
        Self {
            host: Rc::clone(host),
            field,
        }
    }
}

impl<H, T> fmt::Debug for FieldBinding<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<H, T> Binding for FieldBinding<H, T>
where
    T: FromValue + IntoValue + Clone,
{
    fn get(&self) -> Option<Value> {
        let mut host = self.host.borrow_mut();
        (self.field)(&mut host).clone().into_value()
    }

    fn set(&mut self, value: Value) -> Result<(), BindingError> {
        let converted = T::from_value(value)?;
        let mut host = self.host.borrow_mut();
        *(self.field)(&mut host) = converted;
        Ok(())
    }
}

/// A shared standalone slot. Clones observe the same value.
///
/// # Examples
///
/// ```
/// use command_grammar_engine::{Binding, ValueCell, Value};
///
/// let cell = ValueCell::new();
/// let mut writer = cell.clone();
/// writer.set(Value::Bool(true)).unwrap();
/// assert_eq!(cell.value(), Some(Value::Bool(true)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueCell(Rc<RefCell<Option<Value>>>);

impl ValueCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell pre-loaded with `value`.
    pub fn with_value(value: Value) -> Self {
        Self(Rc::new(RefCell::new(Some(value))))
    }

    pub fn value(&self) -> Option<Value> {
        self.0.borrow().clone()
    }

    /// Converts the stored value to `T`.
    pub fn get_as<T: FromValue>(&self) -> Option<Result<T, BindingError>> {
        self.value().map(T::from_value)
    }
}

impl Binding for ValueCell {
    fn get(&self) -> Option<Value> {
        self.value()
    }

    fn set(&mut self, value: Value) -> Result<(), BindingError> {
        *self.0.borrow_mut() = Some(value);
        Ok(())
    }
}
