use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use super::ids::UserId;

pub const DEFAULT_TYPING_QUIET_WINDOW: Duration = Duration::from_millis(3_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Online,
    Offline,
}

/// Online and typing state of the users seen on the live channel.
///
/// Nothing here survives a disconnect: after `reset` every user is unknown
/// again until fresh events arrive.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    quiet_window: Duration,
    online: HashMap<UserId, Presence>,
    typing_until: HashMap<UserId, Instant>,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_QUIET_WINDOW)
    }
}

impl PresenceTracker {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            online: HashMap::new(),
            typing_until: HashMap::new(),
        }
    }

    pub fn on_user_online(&mut self, user: UserId) {
        self.online.insert(user, Presence::Online);
    }

    pub fn on_user_offline(&mut self, user: UserId) {
        self.typing_until.remove(&user);
        self.online.insert(user, Presence::Offline);
    }

    /// Starts or renews the quiet window. A renewal replaces the deadline, it
    /// does not extend the old one.
    pub fn on_user_typing(&mut self, user: UserId, now: Instant) {
        self.typing_until.insert(user, now + self.quiet_window);
    }

    /// `None` means the user has not been observed since the channel came up.
    pub fn presence(&self, user: &UserId) -> Option<Presence> {
        self.online.get(user).copied()
    }

    pub fn is_typing(&self, user: &UserId, now: Instant) -> bool {
        self.typing_until
            .get(user)
            .is_some_and(|deadline| now < *deadline)
    }

    /// Drops typing entries whose window elapsed. Returns true if any did.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.typing_until.len();
        self.typing_until.retain(|_, deadline| now < *deadline);
        before != self.typing_until.len()
    }

    pub fn reset(&mut self) {
        self.online.clear();
        self.typing_until.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    fn tracker() -> PresenceTracker {
        PresenceTracker::new(Duration::from_secs(3))
    }

    #[test]
    fn unknown_until_observed() {
        let tracker = tracker();

        assert_eq!(tracker.presence(&user("u2")), None);
    }

    #[test]
    fn online_and_offline_transitions() {
        let mut tracker = tracker();

        tracker.on_user_online(user("u2"));
        assert_eq!(tracker.presence(&user("u2")), Some(Presence::Online));

        tracker.on_user_offline(user("u2"));
        assert_eq!(tracker.presence(&user("u2")), Some(Presence::Offline));
    }

    #[test]
    fn typing_renewal_resets_the_quiet_window() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let at = |secs| t0 + Duration::from_secs(secs);

        tracker.on_user_typing(user("u2"), at(0));
        tracker.on_user_typing(user("u2"), at(2));

        assert!(tracker.is_typing(&user("u2"), at(4)));
        assert!(!tracker.is_typing(&user("u2"), at(6)));
    }

    #[test]
    fn typing_clears_after_quiet_window_without_renewal() {
        let mut tracker = tracker();
        let t0 = Instant::now();

        tracker.on_user_typing(user("u2"), t0);

        assert!(tracker.is_typing(&user("u2"), t0 + Duration::from_secs(2)));
        assert!(!tracker.is_typing(&user("u2"), t0 + Duration::from_secs(3)));
    }

    #[test]
    fn expire_prunes_elapsed_entries_only() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.on_user_typing(user("u2"), t0);
        tracker.on_user_typing(user("u3"), t0 + Duration::from_secs(2));

        assert!(tracker.expire(t0 + Duration::from_secs(4)));
        assert!(!tracker.is_typing(&user("u2"), t0 + Duration::from_secs(4)));
        assert!(tracker.is_typing(&user("u3"), t0 + Duration::from_secs(4)));
        assert!(!tracker.expire(t0 + Duration::from_secs(4)));
    }

    #[test]
    fn going_offline_stops_typing() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.on_user_typing(user("u2"), t0);

        tracker.on_user_offline(user("u2"));

        assert!(!tracker.is_typing(&user("u2"), t0));
    }

    #[test]
    fn reset_makes_everyone_unknown_again() {
        let mut tracker = tracker();
        tracker.on_user_online(user("u2"));
        tracker.on_user_offline(user("u3"));
        tracker.on_user_typing(user("u2"), Instant::now());

        tracker.reset();

        assert_eq!(tracker.presence(&user("u2")), None);
        assert_eq!(tracker.presence(&user("u3")), None);
        assert!(!tracker.is_typing(&user("u2"), Instant::now()));
    }
}
