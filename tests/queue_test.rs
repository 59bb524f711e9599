//! Admission-queue contract: infallible `put`, advisory `full`, FIFO `get`
//! under concurrent producers and consumers.

use std::sync::Arc;

use uuid::Uuid;
use webhook_receiver::queue::AdmissionQueue;

#[tokio::test]
async fn put_past_capacity_never_fails_and_full_stays_advisory() {
    let queue = AdmissionQueue::new(2);
    for _ in 0..20 {
        queue.put(Uuid::new_v4());
    }
    assert_eq!(queue.qsize(), 20);
    assert!(queue.full());
}

#[tokio::test]
async fn many_producers_and_one_consumer_observe_every_id_exactly_once() {
    let queue = Arc::new(AdmissionQueue::new(5));
    let ids: Vec<Uuid> = (0..50).map(|_| Uuid::new_v4()).collect();

    let producers: Vec<_> = ids
        .chunks(10)
        .map(|chunk| {
            let queue = queue.clone();
            let chunk = chunk.to_vec();
            tokio::spawn(async move {
                for id in chunk {
                    queue.put(id);
                }
            })
        })
        .collect();
    for p in producers {
        p.await.unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..50 {
        seen.push(queue.get().await);
    }

    seen.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(seen, expected);
}
