//! Channel pair: the two input slots of a valve
//!
//! There are always two physical channels, `A` and `B`. Each one remembers the
//! last value pushed into it. Which physical channel currently plays the
//! primary role is a separate piece of state, so swapping roles never loses or
//! copies a stored value.

use fpc_common::InputSide;

/// Physical identity of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    A,
    B,
}

impl ChannelId {
    /// Get the other channel
    pub fn other(&self) -> Self {
        match self {
            ChannelId::A => ChannelId::B,
            ChannelId::B => ChannelId::A,
        }
    }

    fn index(self) -> usize {
        match self {
            ChannelId::A => 0,
            ChannelId::B => 1,
        }
    }
}

/// One input slot holding the latest value
#[derive(Debug)]
pub struct Channel<T> {
    id: ChannelId,
    last: Option<T>,
    pushes: u64,
}

impl<T> Channel<T> {
    fn new(id: ChannelId) -> Self {
        Self {
            id,
            last: None,
            pushes: 0,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Latest value, if anything was ever pushed
    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }

    /// Number of values pushed over the channel's lifetime
    pub fn push_count(&self) -> u64 {
        self.pushes
    }

    fn store(&mut self, value: T) {
        self.last = Some(value);
        self.pushes += 1;
    }
}

/// The two channels plus the current role assignment
#[derive(Debug)]
pub struct ChannelPair<T> {
    channels: [Channel<T>; 2],
    primary: ChannelId,
}

impl<T> Default for ChannelPair<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChannelPair<T> {
    /// Create an empty pair with `A` as primary
    pub fn new() -> Self {
        Self {
            channels: [Channel::new(ChannelId::A), Channel::new(ChannelId::B)],
            primary: ChannelId::A,
        }
    }

    /// Physical channel currently playing `side`
    pub fn id_of(&self, side: InputSide) -> ChannelId {
        match side {
            InputSide::Primary => self.primary,
            InputSide::Secondary => self.primary.other(),
        }
    }

    /// Role currently played by channel `id`
    pub fn side_of(&self, id: ChannelId) -> InputSide {
        if id == self.primary {
            InputSide::Primary
        } else {
            InputSide::Secondary
        }
    }

    pub fn get(&self, id: ChannelId) -> &Channel<T> {
        &self.channels[id.index()]
    }

    /// Latest value on the channel currently playing `side`
    pub fn last(&self, side: InputSide) -> Option<&T> {
        self.get(self.id_of(side)).last()
    }

    /// Store `value` on the channel playing `side`; returns that channel
    pub(crate) fn store(&mut self, side: InputSide, value: T) -> ChannelId {
        let id = self.id_of(side);
        self.channels[id.index()].store(value);
        id
    }

    /// Exchange which physical channel is primary
    pub(crate) fn exchange_roles(&mut self) {
        self.primary = self.primary.other();
    }
}
