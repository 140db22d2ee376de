mod incidents;
mod students;
