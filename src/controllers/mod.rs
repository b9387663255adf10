pub(crate) mod identifier;
pub(crate) mod kanban;
