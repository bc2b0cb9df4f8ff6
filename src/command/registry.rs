use crate::command::error::CommandError;
use crate::command::io::IoSchema;
use crate::command::Command;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// I/O schemas of every known command, built once up front.
#[derive(Default)]
pub struct Registry {
    schemas: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: Command>(&mut self) -> &mut Self {
        self.schemas
            .insert(TypeId::of::<C>(), Box::new(C::describe_io()));
        self
    }

    pub fn contains<C: Command>(&self) -> bool {
        self.schemas.contains_key(&TypeId::of::<C>())
    }

    pub fn schema<C: Command>(&self) -> Result<&IoSchema<C>, CommandError> {
        self.schemas
            .get(&TypeId::of::<C>())
            .and_then(|s| s.downcast_ref::<IoSchema<C>>())
            .ok_or(CommandError::Unregistered(C::NAME))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
