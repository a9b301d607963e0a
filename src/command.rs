use crate::dispatch::LoadOutcome;

/// Messages delivered to the UI loop.
#[derive(Debug)]
pub enum Command {
    Loaded(LoadOutcome),
    Exit,
}
