//! Feeding watch events to a tracker through a pubsub channel.

use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    pubsub::{Subscriber, WaitResult},
};

use crate::{
    storage::KeyValueStore, watch::WatchEvent, NotificationBus, SimInfoConfig, SimInfoTracker,
    Watch,
};

impl<W: Watch, S: KeyValueStore, N: NotificationBus, C: SimInfoConfig> SimInfoTracker<W, S, N, C> {
    /// Handle all watch events currently queued in `subscription`
    pub fn drain_watch_events<
        M: RawMutex,
        const CAP: usize,
        const SUBS: usize,
        const PUBS: usize,
    >(
        &mut self,
        subscription: &mut Subscriber<'_, M, WatchEvent, CAP, SUBS, PUBS>,
    ) {
        while let Some(result) = subscription.try_next_message() {
            self.handle_wait_result(result);
        }
    }

    /// Wait for the next watch event in `subscription` and handle it
    pub async fn process_next_watch_event<
        M: RawMutex,
        const CAP: usize,
        const SUBS: usize,
        const PUBS: usize,
    >(
        &mut self,
        subscription: &mut Subscriber<'_, M, WatchEvent, CAP, SUBS, PUBS>,
    ) {
        let result = subscription.next_message().await;
        self.handle_wait_result(result);
    }

    fn handle_wait_result(&mut self, result: WaitResult<WatchEvent>) {
        match result {
            WaitResult::Message(event) => self.handle(event),
            WaitResult::Lagged(count) => {
                error!("[{}] Lagged {} watch events", self.path(), count);
                self.resync();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::{blocking_mutex::raw::NoopRawMutex, pubsub::PubSubChannel};

    use crate::{
        fakes::{FakeSim, FakeWatch},
        MemoryStore, SimInfoEvent,
    };

    use super::*;

    const ICCID: &str = "89457387300008689393";
    const IMSI: &str = "001010000000001";

    type Tracker = SimInfoTracker<FakeWatch, MemoryStore, Vec<SimInfoEvent>>;

    fn tracker() -> Tracker {
        SimInfoTracker::new(FakeWatch::default(), MemoryStore::new(), Vec::new())
    }

    #[test]
    fn drains_queued_events_in_order() {
        let channel = PubSubChannel::<NoopRawMutex, WatchEvent, 4, 1, 0>::new();
        let mut subscription = channel.subscriber().unwrap();
        let publisher = channel.immediate_publisher();
        let mut tracker = tracker();

        tracker.watch_mut().iccid = Some(ICCID.into());
        tracker.watch_mut().imsi = Some(IMSI.into());
        tracker.watch_mut().sim = Some(FakeSim::ready("001", "01"));
        publisher.publish_immediate(WatchEvent::IccidChanged);
        publisher.publish_immediate(WatchEvent::ImsiChanged);

        tracker.drain_watch_events(&mut subscription);

        assert_eq!(Some(ICCID), tracker.iccid());
        assert_eq!(Some(IMSI), tracker.imsi());
        assert_eq!(Some("00101"), tracker.spn());
        assert_eq!(
            vec![
                SimInfoEvent::IccidChanged,
                SimInfoEvent::ImsiChanged,
                SimInfoEvent::SpnChanged
            ],
            *tracker.bus()
        );
    }

    #[test]
    fn lagged_subscription_resyncs() {
        let channel = PubSubChannel::<NoopRawMutex, WatchEvent, 1, 1, 0>::new();
        let mut subscription = channel.subscriber().unwrap();
        let publisher = channel.immediate_publisher();
        let mut tracker = tracker();

        tracker.watch_mut().iccid = Some(ICCID.into());
        tracker.watch_mut().imsi = Some(IMSI.into());
        tracker.watch_mut().spn = Some("Operator".into());
        publisher.publish_immediate(WatchEvent::IccidChanged);
        publisher.publish_immediate(WatchEvent::ImsiChanged);
        publisher.publish_immediate(WatchEvent::SpnChanged);

        tracker.drain_watch_events(&mut subscription);

        assert_eq!(Some(ICCID), tracker.iccid());
        assert_eq!(Some(IMSI), tracker.imsi());
        assert_eq!(Some("Operator"), tracker.spn());
        assert_eq!(
            vec![
                SimInfoEvent::IccidChanged,
                SimInfoEvent::ImsiChanged,
                SimInfoEvent::SpnChanged
            ],
            *tracker.bus()
        );
    }

    #[tokio::test]
    async fn processes_next_event() {
        let channel = PubSubChannel::<NoopRawMutex, WatchEvent, 4, 1, 0>::new();
        let mut subscription = channel.subscriber().unwrap();
        let publisher = channel.immediate_publisher();
        let mut tracker = tracker();

        tracker.watch_mut().iccid = Some(ICCID.into());
        publisher.publish_immediate(WatchEvent::IccidChanged);
        tracker.process_next_watch_event(&mut subscription).await;

        assert_eq!(Some(ICCID), tracker.iccid());
        assert_eq!(vec![SimInfoEvent::IccidChanged], *tracker.bus());
    }
}
