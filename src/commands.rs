use crate::args::{ArgValue, BoundArgs};
use crate::error::ListenerError;
use crate::event_kind::EventKind;
use crate::host::{ListenerHost, ListenerOwner};
use crate::listener::{Callback, EventPayload};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Command<O> = Box<dyn FnOnce(&mut ListenerHost<O>) -> Result<(), ListenerError>>;

/// Deferred listener changes, for callbacks that need to add or remove listeners.
///
/// Callbacks cannot reach the registry that is dispatching them. They capture a
/// clone of this queue instead; the host applies the queued changes once the
/// current dispatch has returned, in the order they were queued.
pub struct ListenerCommands<O: ListenerOwner> {
    queue: Rc<RefCell<VecDeque<Command<O>>>>,
}

impl<O: ListenerOwner> ListenerCommands<O> {
    pub fn new() -> Self {
        Self { queue: Rc::new(RefCell::new(VecDeque::new())) }
    }

    pub fn add_listener<P: EventPayload>(
        &self,
        owner: O,
        kind: EventKind,
        callback: &Callback<P>,
        args: impl IntoIterator<Item = ArgValue>,
    ) {
        let callback = callback.clone();
        let args: BoundArgs = args.into_iter().collect();
        self.push(move |host| host.add_listener(owner, kind, &callback, args));
    }

    pub fn remove_listener<P: EventPayload>(
        &self,
        owner: O,
        kind: EventKind,
        callback: &Callback<P>,
        check_args: bool,
        args: &[ArgValue],
    ) {
        let callback = callback.clone();
        let args: BoundArgs = args.iter().cloned().collect();
        self.push(move |host| host.remove_listener(owner, kind, &callback, check_args, &args).map(|_| ()));
    }

    pub fn remove_all_listeners_of(&self, owner: O, kind: EventKind) {
        self.push(move |host| {
            host.remove_all_listeners_of(owner, kind);
            Ok(())
        });
    }

    pub fn remove_all_listeners(&self, owner: O) {
        self.push(move |host| {
            host.remove_all_listeners(owner);
            Ok(())
        });
    }

    pub fn despawn(&self, owner: O) {
        self.push(move |host| {
            host.despawn(owner);
            Ok(())
        });
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }

    fn push(&self, command: impl FnOnce(&mut ListenerHost<O>) -> Result<(), ListenerError> + 'static) {
        self.queue.borrow_mut().push_back(Box::new(command));
    }

    pub(crate) fn pop(&self) -> Option<Command<O>> {
        self.queue.borrow_mut().pop_front()
    }
}

impl<O: ListenerOwner> Clone for ListenerCommands<O> {
    fn clone(&self) -> Self {
        Self { queue: Rc::clone(&self.queue) }
    }
}

impl<O: ListenerOwner> Default for ListenerCommands<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ListenerOwner> fmt::Debug for ListenerCommands<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerCommands").field("queued", &self.len()).finish()
    }
}
