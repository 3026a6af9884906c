#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tokio::sync::Notify;
    use vetbook_common::services::mock::{MockFailure, MockVetService};
    use vetbook_common::{
        Booking, BookingRequest, BookingStatus, BoxFuture, ErrorKind, NewSlot, Session, Slot,
        StaticSession, VetService, VetbookError,
    };
    use vetbook_config::BookingRules;

    use crate::confirm::{AutoConfirm, Decline};
    use crate::reconciler::{BookingReconciler, CancelOutcome, LoadOutcome};

    const TOKEN: &str = "user-token";
    const PHONE: &str = "9876543210";

    fn slot(id: i64, offset: Duration) -> Slot {
        Slot {
            id,
            start_at: Utc::now() + offset,
            duration_minutes: 30,
            booked: false,
            doctor: None,
        }
    }

    fn booking(id: i64, offset: Duration) -> Booking {
        Booking {
            id,
            start_at: Utc::now() + offset,
            duration_minutes: 30,
            phone: Some(PHONE.into()),
            message: Some("checkup".into()),
            doctor: None,
            user: None,
        }
    }

    fn logged_in() -> Arc<dyn Session> {
        Arc::new(StaticSession::new(Some(TOKEN.into()), Some("USER".into())))
    }

    fn reconciler_with(service: Arc<MockVetService>, session: Arc<dyn Session>) -> BookingReconciler {
        BookingReconciler::new(service, session, BookingRules::default())
    }

    fn two_future_slots() -> Arc<MockVetService> {
        Arc::new(MockVetService::with_slots(vec![
            slot(1, Duration::days(1)),
            slot(2, Duration::days(2)),
        ]))
    }

    #[tokio::test]
    async fn test_load_drops_past_slots() {
        let service = Arc::new(MockVetService::with_slots(vec![
            slot(1, Duration::days(1)),
            slot(2, Duration::days(-1)),
        ]));
        let reconciler = reconciler_with(service, logged_in());

        let outcome = reconciler.load_available_slots().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Applied);
        let ids: Vec<i64> = reconciler.available_slots().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_selecting_b_replaces_a() {
        let reconciler = reconciler_with(two_future_slots(), logged_in());
        reconciler.load_available_slots().await.unwrap();

        reconciler.select_slot(1).unwrap();
        reconciler.select_slot(2).unwrap();

        assert_eq!(reconciler.snapshot().selected, Some(2));
        assert_eq!(reconciler.selected_slot().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_selecting_unknown_slot_keeps_previous() {
        let reconciler = reconciler_with(two_future_slots(), logged_in());
        reconciler.load_available_slots().await.unwrap();
        reconciler.select_slot(1).unwrap();

        let err = reconciler.select_slot(99).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(reconciler.snapshot().selected, Some(1));
    }

    #[tokio::test]
    async fn test_clear_selection_keeps_form_draft() {
        let reconciler = reconciler_with(two_future_slots(), logged_in());
        reconciler.load_available_slots().await.unwrap();
        reconciler.select_slot(2).unwrap();
        reconciler.set_phone(PHONE);

        reconciler.clear_selection();

        assert!(reconciler.selected_slot().is_none());
        assert_eq!(reconciler.form().phone, PHONE);
        let err = reconciler.submit_pending().await.unwrap_err();
        assert_eq!(err.to_string(), "Please choose an available slot");
    }

    #[tokio::test]
    async fn test_short_phone_rejected_before_network() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.load_available_slots().await.unwrap();

        let err = reconciler.submit_booking(1, "12345", "checkup").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!service.calls().contains(&"create_booking".to_string()));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.load_available_slots().await.unwrap();

        let err = reconciler.submit_booking(1, PHONE, "").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!service.calls().contains(&"create_booking".to_string()));
    }

    #[tokio::test]
    async fn test_successful_booking_reloads_both_lists() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.refresh().await.unwrap();
        reconciler.select_slot(1).unwrap();
        reconciler.set_phone(PHONE);
        reconciler.set_message("limping after a fall");

        let booking = reconciler.submit_pending().await.unwrap();

        let state = reconciler.snapshot();
        assert!(state.available.iter().all(|s| s.id != 1));
        assert_eq!(state.bookings.len(), 1);
        assert_eq!(state.bookings[0].id, booking.id);
        assert_eq!(state.bookings[0].message.as_deref(), Some("limping after a fall"));
        assert_eq!(state.selected, None);
        assert!(state.form.phone.is_empty());
        assert!(state.form.message.is_empty());
        assert!(service.slot(1).unwrap().booked);
    }

    #[tokio::test]
    async fn test_failed_booking_leaves_state_untouched() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.refresh().await.unwrap();
        reconciler.select_slot(2).unwrap();
        reconciler.set_phone(PHONE);
        reconciler.set_message("coughing");
        let before = reconciler.snapshot();
        service.fail_next(
            "create_booking",
            MockFailure::Service(500, "Booking failed: database unavailable".into()),
        );

        let err = reconciler.submit_pending().await.unwrap_err();

        assert_eq!(err.to_string(), "Booking failed: database unavailable");
        assert_eq!(reconciler.snapshot(), before);
        assert!(!reconciler.is_busy());
    }

    #[tokio::test]
    async fn test_network_failure_is_reported() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.load_available_slots().await.unwrap();
        service.fail_next("create_booking", MockFailure::Network("connection refused".into()));

        let err = reconciler.submit_booking(1, PHONE, "checkup").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(reconciler.available_slots().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_session_fails_before_any_call() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), Arc::new(StaticSession::anonymous()));

        let err = reconciler.submit_booking(1, PHONE, "checkup").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_user_bookings_skipped_without_session() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), Arc::new(StaticSession::anonymous()));

        let outcome = reconciler.load_user_bookings().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Skipped);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_last_known_good() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.load_available_slots().await.unwrap();
        service.fail_next("fetch_slots", MockFailure::Network("offline".into()));

        assert!(reconciler.load_available_slots().await.is_err());
        assert_eq!(reconciler.available_slots().len(), 2);
    }

    #[tokio::test]
    async fn test_selection_dropped_when_slot_taken_elsewhere() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.load_available_slots().await.unwrap();
        reconciler.select_slot(1).unwrap();

        // Someone else books slot 1
        service
            .create_booking(
                "other-user",
                BookingRequest {
                    slot_id: 1,
                    phone: PHONE.into(),
                    message: "x".into(),
                },
            )
            .await
            .unwrap();
        reconciler.load_available_slots().await.unwrap();

        assert_eq!(reconciler.snapshot().selected, None);
        let err = reconciler.submit_booking(1, PHONE, "checkup").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_past_booking_cannot_be_cancelled() {
        let service = two_future_slots();
        service.insert_booking(TOKEN, 50, booking(50, Duration::hours(-3)));
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.load_user_bookings().await.unwrap();

        let views = reconciler.booking_views();
        assert_eq!(views[0].status, BookingStatus::Completed);
        assert!(!views[0].cancellable);

        let err = reconciler.cancel_booking(50, &AutoConfirm).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!service.calls().contains(&"cancel_booking".to_string()));
    }

    #[tokio::test]
    async fn test_cancel_requires_confirmation() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.refresh().await.unwrap();
        let booked = reconciler.submit_booking(1, PHONE, "checkup").await.unwrap();

        let declined = reconciler.cancel_booking(booked.id, &Decline).await.unwrap();
        assert_eq!(declined, CancelOutcome::Declined);
        assert!(!service.calls().contains(&"cancel_booking".to_string()));

        let prompts = std::sync::Mutex::new(Vec::new());
        let confirm = |prompt: &str| {
            prompts.lock().unwrap().push(prompt.to_string());
            true
        };
        let cancelled = reconciler.cancel_booking(booked.id, &confirm).await.unwrap();

        assert_eq!(cancelled, CancelOutcome::Cancelled);
        assert_eq!(prompts.lock().unwrap().len(), 1);
        assert!(reconciler.user_bookings().is_empty());
        assert!(reconciler.available_slots().iter().any(|s| s.id == 1));
    }

    #[tokio::test]
    async fn test_failed_reload_after_booking_blocks_reselection() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.refresh().await.unwrap();
        service.fail_next("fetch_slots", MockFailure::Network("offline".into()));

        let booking = reconciler.submit_booking(1, PHONE, "checkup").await.unwrap();

        assert!(service.slot(1).unwrap().booked);
        let reason = reconciler.stale_reason().unwrap();
        assert!(reason.contains("offline"));
        assert_eq!(reconciler.snapshot().stale.as_deref(), Some(reason.as_str()));

        let err = reconciler.select_slot(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = reconciler.submit_booking(1, PHONE, "again").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let bookings_made = service.calls().iter().filter(|c| *c == "create_booking").count();
        assert_eq!(bookings_made, 1);

        reconciler.refresh().await.unwrap();

        assert!(reconciler.stale_reason().is_none());
        let ids: Vec<i64> = reconciler.available_slots().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(reconciler.user_bookings()[0].id, booking.id);
        reconciler.select_slot(2).unwrap();
    }

    #[tokio::test]
    async fn test_failed_reload_after_cancel_blocks_second_cancel() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.refresh().await.unwrap();
        let booked = reconciler.submit_booking(2, PHONE, "checkup").await.unwrap();
        service.fail_next("fetch_user_bookings", MockFailure::Service(503, "Unavailable".into()));

        let outcome = reconciler.cancel_booking(booked.id, &AutoConfirm).await.unwrap();

        assert_eq!(outcome, CancelOutcome::Cancelled);
        assert!(reconciler.stale_reason().unwrap().contains("Unavailable"));
        let err = reconciler.cancel_booking(booked.id, &AutoConfirm).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let cancels = service.calls().iter().filter(|c| *c == "cancel_booking").count();
        assert_eq!(cancels, 1);
    }

    #[tokio::test]
    async fn test_failed_cancel_keeps_booking() {
        let service = two_future_slots();
        let reconciler = reconciler_with(service.clone(), logged_in());
        reconciler.refresh().await.unwrap();
        let booked = reconciler.submit_booking(2, PHONE, "checkup").await.unwrap();
        service.fail_next("cancel_booking", MockFailure::Service(403, "Forbidden".into()));

        let err = reconciler.cancel_booking(booked.id, &AutoConfirm).await.unwrap_err();

        assert_eq!(err.to_string(), "Forbidden");
        assert_eq!(reconciler.user_bookings().len(), 1);
    }

    /// Delegates to the mock, parking the first call of one operation until
    /// the test releases it.
    struct GatedService {
        inner: MockVetService,
        gated: &'static str,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl GatedService {
        fn new(inner: MockVetService, gated: &'static str) -> Self {
            Self {
                inner,
                gated,
                armed: AtomicBool::new(true),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }

        async fn pass(&self, operation: &str) {
            if operation == self.gated && self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
        }
    }

    impl VetService for GatedService {
        fn fetch_slots(&self) -> BoxFuture<'_, Vec<Slot>, VetbookError> {
            Box::pin(async move {
                self.pass("fetch_slots").await;
                self.inner.fetch_slots().await
            })
        }

        fn fetch_my_slots(&self, token: &str) -> BoxFuture<'_, Vec<Slot>, VetbookError> {
            self.inner.fetch_my_slots(token)
        }

        fn create_slot(&self, token: &str, slot: NewSlot) -> BoxFuture<'_, Slot, VetbookError> {
            self.inner.create_slot(token, slot)
        }

        fn delete_slot(&self, token: &str, slot_id: i64) -> BoxFuture<'_, (), VetbookError> {
            self.inner.delete_slot(token, slot_id)
        }

        fn fetch_user_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError> {
            self.inner.fetch_user_bookings(token)
        }

        fn fetch_doctor_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError> {
            self.inner.fetch_doctor_bookings(token)
        }

        fn create_booking(
            &self,
            token: &str,
            request: BookingRequest,
        ) -> BoxFuture<'_, Booking, VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                self.pass("create_booking").await;
                self.inner.create_booking(&token, request).await
            })
        }

        fn cancel_booking(&self, token: &str, booking_id: i64) -> BoxFuture<'_, (), VetbookError> {
            self.inner.cancel_booking(token, booking_id)
        }
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_busy() {
        let gated = Arc::new(GatedService::new(
            MockVetService::with_slots(vec![slot(1, Duration::days(1))]),
            "create_booking",
        ));
        let reconciler = BookingReconciler::new(gated.clone(), logged_in(), BookingRules::default());
        reconciler.load_available_slots().await.unwrap();

        let first = reconciler.submit_booking(1, PHONE, "first");
        let second = async {
            gated.entered.notified().await;
            assert!(reconciler.is_busy());
            let result = reconciler.submit_booking(1, PHONE, "second").await;
            gated.release.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().kind(), ErrorKind::Busy);
        assert!(!reconciler.is_busy());
        assert_eq!(reconciler.user_bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_response_after_detach_is_discarded() {
        let gated = Arc::new(GatedService::new(
            MockVetService::with_slots(vec![slot(1, Duration::days(1))]),
            "fetch_slots",
        ));
        let reconciler = BookingReconciler::new(gated.clone(), logged_in(), BookingRules::default());

        let load = reconciler.load_available_slots();
        let navigate_away = async {
            gated.entered.notified().await;
            reconciler.detach();
            gated.release.notify_one();
        };
        let (outcome, _) = tokio::join!(load, navigate_away);

        assert_eq!(outcome.unwrap(), LoadOutcome::Discarded);
        assert!(reconciler.available_slots().is_empty());
    }

    #[tokio::test]
    async fn test_older_load_does_not_overwrite_newer() {
        let inner = MockVetService::new();
        inner.insert_slot(None, slot(1, Duration::days(1)));
        let gated = Arc::new(GatedService::new(inner, "fetch_slots"));
        let reconciler = BookingReconciler::new(gated.clone(), logged_in(), BookingRules::default());

        let older = reconciler.load_available_slots();
        let newer = async {
            gated.entered.notified().await;
            gated.inner.insert_slot(None, slot(2, Duration::days(2)));
            let outcome = reconciler.load_available_slots().await;
            gated.release.notify_one();
            outcome
        };
        let (older, newer) = tokio::join!(older, newer);

        assert_eq!(newer.unwrap(), LoadOutcome::Applied);
        assert_eq!(older.unwrap(), LoadOutcome::Discarded);
        assert_eq!(reconciler.available_slots().len(), 2);
    }
}
