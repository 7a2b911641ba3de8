//! Tests for lease expiry timers.

use super::*;
use tokio::sync::mpsc;

const LEASE: Duration = Duration::from_millis(100);

/// Callback that claims the expiry and reports the outcome on a channel
fn claiming_callback(
    tx: mpsc::UnboundedSender<(MessageId, bool)>,
) -> impl FnOnce(Expiry) + Send + 'static {
    move |expiry: Expiry| {
        let claimed = expiry.claim();
        let _ = tx.send((expiry.id().clone(), claimed));
    }
}

// ============================================================================
// Arming and firing
// ============================================================================

mod firing {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_after_duration() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = MessageId::new();

        scheduler
            .arm(id.clone(), LEASE, claiming_callback(tx))
            .unwrap();
        assert!(scheduler.is_armed(&id));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err(), "timer fired early");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(rx.try_recv().unwrap(), (id.clone(), true));
        assert!(!scheduler.is_armed(&id));
        assert_eq!(scheduler.armed_count(), 0);

        tokio::time::sleep(LEASE * 5).await;
        assert!(rx.try_recv().is_err(), "timer fired twice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_fires_on_next_tick() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = MessageId::new();

        scheduler
            .arm(id.clone(), Duration::ZERO, claiming_callback(tx))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(rx.try_recv().unwrap(), (id, true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_identifiers_fire_independently() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let short = MessageId::new();
        let long = MessageId::new();

        scheduler
            .arm(short.clone(), LEASE, claiming_callback(tx.clone()))
            .unwrap();
        scheduler
            .arm(long.clone(), LEASE * 3, claiming_callback(tx))
            .unwrap();
        assert_eq!(scheduler.armed_count(), 2);

        tokio::time::sleep(LEASE * 2).await;
        assert_eq!(rx.try_recv().unwrap(), (short, true));
        assert!(scheduler.is_armed(&long));

        tokio::time::sleep(LEASE * 2).await;
        assert_eq!(rx.try_recv().unwrap(), (long, true));
    }

    #[test]
    fn test_arm_outside_runtime_is_rejected() {
        let scheduler = LeaseScheduler::new();
        let result = scheduler.arm(MessageId::new(), LEASE, |_expiry| {});

        assert!(matches!(result, Err(QueueError::StorageFault { .. })));
        assert_eq!(scheduler.armed_count(), 0);
    }
}

// ============================================================================
// Cancellation
// ============================================================================

mod cancellation {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_callback() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = MessageId::new();

        scheduler
            .arm(id.clone(), LEASE, claiming_callback(tx))
            .unwrap();
        assert!(scheduler.cancel(&id));
        assert!(!scheduler.is_armed(&id));

        tokio::time::sleep(LEASE * 3).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_unknown_is_noop() {
        let scheduler = LeaseScheduler::new();
        assert!(!scheduler.cancel(&MessageId::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_claim_after_cancel_fails() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = MessageId::new();

        // Hold the expiry without claiming it, as an in-flight handler would
        scheduler
            .arm(id.clone(), Duration::ZERO, move |expiry| {
                let _ = tx.send(expiry);
            })
            .unwrap();

        let expiry = rx.recv().await.unwrap();
        assert!(scheduler.is_armed(&id), "firing alone must not disarm");

        assert!(scheduler.cancel(&id));
        assert!(!expiry.claim());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_claim_is_noop() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = MessageId::new();

        scheduler
            .arm(id.clone(), Duration::ZERO, move |expiry| {
                let _ = tx.send(expiry);
            })
            .unwrap();

        let expiry = rx.recv().await.unwrap();
        assert!(expiry.claim());
        assert!(!expiry.claim(), "an arming can only be claimed once");
        assert!(!scheduler.cancel(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_scheduler_invalidates_expiries() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        scheduler
            .arm(MessageId::new(), Duration::ZERO, move |expiry| {
                let _ = tx.send(expiry);
            })
            .unwrap();

        let expiry = rx.recv().await.unwrap();
        drop(scheduler);
        assert!(!expiry.claim());
    }
}

// ============================================================================
// Re-arming
// ============================================================================

mod rearming {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = MessageId::new();

        let first_tx = tx.clone();
        scheduler
            .arm(id.clone(), LEASE, move |expiry| {
                let _ = first_tx.send(("first", expiry.claim()));
            })
            .unwrap();
        scheduler
            .arm(id.clone(), LEASE * 2, move |expiry| {
                let _ = tx.send(("second", expiry.claim()));
            })
            .unwrap();
        assert_eq!(scheduler.armed_count(), 1);

        tokio::time::sleep(LEASE * 5).await;
        assert_eq!(rx.try_recv().unwrap(), ("second", true));
        assert!(rx.try_recv().is_err(), "replaced timer must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_expiry_cannot_claim_newer_arming() {
        let scheduler = LeaseScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = MessageId::new();

        scheduler
            .arm(id.clone(), Duration::ZERO, move |expiry| {
                let _ = tx.send(expiry);
            })
            .unwrap();
        let stale = rx.recv().await.unwrap();

        scheduler.arm(id.clone(), LEASE, |_expiry| {}).unwrap();

        assert!(!stale.claim());
        assert!(scheduler.is_armed(&id));
    }
}
