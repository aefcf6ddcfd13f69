use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;

use booking_queue_cell::{BookingQueueError, EventQueue, SchedulingEvent, SchedulingEventKind};

#[test]
fn events_serialize_with_a_type_tag() {
    let appointment_id = Uuid::new_v4();
    let changed_by = Uuid::new_v4();
    let event = SchedulingEvent::new(
        appointment_id,
        SchedulingEventKind::StatusChanged {
            from: "SCHEDULED".to_string(),
            to: "CANCELLED".to_string(),
            changed_by,
        },
    );

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["appointment_id"], json!(appointment_id));
    assert_eq!(
        value["kind"],
        json!({ "type": "status_changed", "from": "SCHEDULED", "to": "CANCELLED", "changed_by": changed_by })
    );

    let decoded: SchedulingEvent = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, event);
}

#[tokio::test]
async fn concurrent_publishers_all_land_in_the_journal() {
    let queue = Arc::new(EventQueue::new(64));
    let mut subscriber = queue.subscribe();

    let publishers: Vec<_> = (0..10)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue
                    .publish(SchedulingEvent::new(
                        Uuid::new_v4(),
                        SchedulingEventKind::DoctorNotesUpdated { doctor_id: Uuid::new_v4() },
                    ))
                    .await;
            })
        })
        .collect();
    for publisher in publishers {
        publisher.await.unwrap();
    }

    assert_eq!(queue.journal().await.len(), 10);
    let mut received = 0;
    while let Some(event) = subscriber.try_recv() {
        assert!(event.is_ok());
        received += 1;
    }
    assert_eq!(received, 10);
    assert_eq!(queue.stats().await.delivered_to_subscribers, 10);
}

#[tokio::test]
async fn subscribers_see_close_once_the_queue_is_gone() {
    let queue = EventQueue::new(4);
    let mut subscriber = queue.subscribe();
    drop(queue);

    assert_matches!(subscriber.recv().await, Err(BookingQueueError::Closed));
}
