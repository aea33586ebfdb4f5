use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, warn};

use crate::event::{AccessoryCommand, CommandHandler};

/// Handle returned by [`CommandBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    handler: Box<dyn CommandHandler>,
}

struct Channel {
    name: String,
    subscribers: RefCell<Vec<Subscriber>>,
    /// Subscriptions made while delivering, added once delivery finishes
    pending: RefCell<Vec<Subscriber>>,
    next_subscription: Cell<u64>,
}

/// A named publish/subscribe channel for [`AccessoryCommand`]s.
///
/// Clones share the same channel, so every UI control can keep its own handle
/// and publish without knowing who listens. Delivery is synchronous and reaches
/// exactly the handlers subscribed at the moment of publishing; nothing is kept
/// around for subscribers that arrive later.
#[derive(Clone)]
pub struct CommandBus {
    channel: Rc<Channel>,
}

impl std::fmt::Debug for CommandBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self
            .channel
            .subscribers
            .try_borrow()
            .map(|subscribers| subscribers.len());
        f.debug_struct("CommandBus")
            .field("name", &self.channel.name)
            .field("handlers", &match handlers {
                Ok(count) => format!("<{count} handlers>"),
                Err(_) => "<delivering>".to_string(),
            })
            .finish()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new("accessories")
    }
}

impl CommandBus {
    /// Creates a new, empty channel
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            channel: Rc::new(Channel {
                name: name.into(),
                subscribers: RefCell::new(Vec::new()),
                pending: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.channel.name
    }

    /// Subscribe a handler to receive commands.
    ///
    /// A handler subscribed from inside another handler starts receiving with
    /// the next publish.
    pub fn subscribe(&self, handler: impl CommandHandler + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.channel.next_subscription.get());
        self.channel.next_subscription.set(id.0 + 1);
        let subscriber = Subscriber {
            id,
            handler: Box::new(handler),
        };

        match self.channel.subscribers.try_borrow_mut() {
            Ok(mut subscribers) => subscribers.push(subscriber),
            Err(_) => {
                debug!("Queueing subscription to {:?} until delivery ends", self.channel.name);
                self.channel.pending.borrow_mut().push(subscriber);
            }
        }
        id
    }

    /// Removes a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut subscribers) = self.channel.subscribers.try_borrow_mut() else {
            let mut pending = self.channel.pending.borrow_mut();
            let before = pending.len();
            pending.retain(|subscriber| subscriber.id != id);
            if pending.len() != before {
                return true;
            }
            warn!("Cannot unsubscribe from {:?} while it is delivering", self.channel.name);
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        subscribers.len() != before
    }

    /// Delivers `command` to every current subscriber, in subscription order.
    ///
    /// Publishing from inside a handler is not supported: the nested command is
    /// dropped with a warning rather than queued.
    pub fn publish(&self, command: AccessoryCommand) {
        let Ok(mut subscribers) = self.channel.subscribers.try_borrow_mut() else {
            warn!(
                "Dropping re-entrant {:?} on {:?}",
                command.name(),
                self.channel.name
            );
            return;
        };
        debug!(
            "Publishing {:?} on {:?} to {} handler(s)",
            command.name(),
            self.channel.name,
            subscribers.len()
        );
        for subscriber in subscribers.iter_mut() {
            subscriber.handler.handle_command(&command);
        }
        subscribers.append(&mut self.channel.pending.borrow_mut());
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel
            .subscribers
            .try_borrow()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
            + self.channel.pending.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(bus: &CommandBus) -> (SubscriptionId, Rc<RefCell<Vec<AccessoryCommand>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = bus.subscribe(move |command: &AccessoryCommand| {
            sink.borrow_mut().push(command.clone());
        });
        (id, seen)
    }

    #[test]
    fn test_clones_share_the_channel() {
        let bus = CommandBus::default();
        let (_, seen) = recorder(&bus);

        let hat_button = bus.clone();
        let delete_button = bus.clone();
        hat_button.publish(AccessoryCommand::add("accessories/hat"));
        delete_button.publish(AccessoryCommand::DeleteSelected);

        assert_eq!(
            *seen.borrow(),
            [
                AccessoryCommand::add("accessories/hat"),
                AccessoryCommand::DeleteSelected
            ]
        );
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = CommandBus::new("accessories");
        bus.publish(AccessoryCommand::DeleteSelected);

        let (_, seen) = recorder(&bus);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = CommandBus::new("accessories");
        let (id, seen) = recorder(&bus);
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(AccessoryCommand::DeleteSelected);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_reentrant_publish_is_dropped() {
        let bus = CommandBus::new("accessories");
        let inner = bus.clone();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        bus.subscribe(move |_: &AccessoryCommand| {
            counter.set(counter.get() + 1);
            inner.publish(AccessoryCommand::DeleteSelected);
        });

        bus.publish(AccessoryCommand::DeleteSelected);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_subscribe_during_delivery_takes_effect_next_publish() {
        let bus = CommandBus::new("accessories");
        let inner = bus.clone();
        let late = Rc::new(RefCell::new(None));
        let late_slot = Rc::clone(&late);
        let late_calls = Rc::new(Cell::new(0));
        let late_counter = Rc::clone(&late_calls);
        bus.subscribe(move |_: &AccessoryCommand| {
            if late_slot.borrow().is_none() {
                let counter = Rc::clone(&late_counter);
                let id = inner.subscribe(move |_: &AccessoryCommand| {
                    counter.set(counter.get() + 1);
                });
                *late_slot.borrow_mut() = Some(id);
            }
        });

        bus.publish(AccessoryCommand::DeleteSelected);
        assert_eq!(late_calls.get(), 0);
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(AccessoryCommand::DeleteSelected);
        assert_eq!(late_calls.get(), 1);

        let id = (*late.borrow()).unwrap();
        assert!(bus.unsubscribe(id));
        bus.publish(AccessoryCommand::DeleteSelected);
        assert_eq!(late_calls.get(), 1);
    }
}
