//! Task definition creation.

mod create_task_definition;

pub use create_task_definition::{
    CreateTaskDefinitionCommand, CreateTaskDefinitionError, CreateTaskDefinitionHandler,
};
