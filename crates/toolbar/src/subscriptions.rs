use inkstone_core::Subscription;

/// Owns every registration the controller makes, so teardown is a single
/// call. Disposing twice is harmless; dropping the set disposes it.
#[derive(Default)]
pub struct SubscriptionSet {
    subs: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sub: Subscription) {
        self.subs.push(sub);
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    pub fn dispose(&mut self) {
        for sub in self.subs.drain(..) {
            sub.cancel();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.dispose();
    }
}
