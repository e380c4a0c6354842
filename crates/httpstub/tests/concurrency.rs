//! Consumption semantics under concurrent traffic.

use httpstub::{RequestDescriptor, ResponseDescriptor, StubServer};
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_each_consume_a_distinct_expectation() {
    let server = StubServer::start().await.unwrap();
    let total: usize = 8;
    for i in 0..total {
        server.expect(
            RequestDescriptor::get("/job").build().unwrap(),
            ResponseDescriptor::ok().body(format!("slot-{i}")).build(),
        );
    }
    let registry = server.registry();
    let url = format!("{}/job", server.base_url());

    let mut tasks = JoinSet::new();
    for _ in 0..total {
        let url = url.clone();
        // One client per task so requests ride separate connections.
        tasks.spawn(async move {
            let response = reqwest::Client::new().get(&url).send().await.unwrap();
            assert_eq!(response.status(), 200);
            response.text().await.unwrap()
        });
    }

    let mut bodies = Vec::new();
    while let Some(result) = tasks.join_next().await {
        bodies.push(result.unwrap());
    }
    bodies.sort();
    bodies.dedup();

    // No expectation was served twice, and none were left over.
    assert_eq!(bodies.len(), total);
    assert_eq!(registry.pending_count(), 0);
    assert_eq!(registry.request_count(), total as u64);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn expectations_can_be_added_while_traffic_is_in_flight() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/first").build().unwrap(),
        ResponseDescriptor::ok().body("one").build(),
    );

    let first = reqwest::get(format!("{}/first", server.base_url())).await.unwrap();
    assert_eq!(first.text().await.unwrap(), "one");

    // Lazy registration after the server has already served traffic.
    server.expect(
        RequestDescriptor::get("/second").build().unwrap(),
        ResponseDescriptor::ok().body("two").build(),
    );

    let second = reqwest::get(format!("{}/second", server.base_url())).await.unwrap();
    assert_eq!(second.text().await.unwrap(), "two");

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pending_count_decreases_by_one_per_consumption() {
    let server = StubServer::start().await.unwrap();
    let registry = server.registry();
    for _ in 0..3 {
        server.expect(
            RequestDescriptor::get("/step").build().unwrap(),
            ResponseDescriptor::ok().build(),
        );
    }
    let url = format!("{}/step", server.base_url());

    for remaining in (0..3usize).rev() {
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(registry.pending_count(), remaining);
    }

    server.shutdown().await.unwrap();
}
