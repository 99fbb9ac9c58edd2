//! Session notifications and control messages.

use mania_rule::JudgementResult;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Chart and audio are loaded.
    Init,
    Started,
    Pause,
    Resume,
    Restart,
    Hit(JudgementResult),
}

/// Messages the orchestrator applies to the session between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    TogglePause,
    Restart,
    Destroy,
    SetOffset(f64),
    ChangeScrollSpeed(f64),
    SetLogicRate(u32),
}

pub type Listener = Box<dyn FnMut(&SessionEvent)>;

/// Callbacks injected by the host, invoked in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: &SessionEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
