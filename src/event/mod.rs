mod bus;
mod events;

pub use bus::{CommandBus, SubscriptionId};
pub use events::AccessoryCommand;

/// Receives commands published on a [`CommandBus`].
pub trait CommandHandler {
    fn handle_command(&mut self, command: &AccessoryCommand);
}

/// Closures work as handlers too
impl<F: FnMut(&AccessoryCommand)> CommandHandler for F {
    fn handle_command(&mut self, command: &AccessoryCommand) {
        self(command)
    }
}
