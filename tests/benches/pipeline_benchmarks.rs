//! # Endorsement Pipeline Benchmarks
//!
//! CPU-bound stages of one contract operation, without transport:
//!
//! | Stage | Crate | Input |
//! |-------|-------|-------|
//! | Consistency grouping | lc-02 | N responses, 1 or 2 payloads |
//! | Policy evaluation | lc-02 | N agreeing responses |
//! | Signature policy | lc-02 | `2-of` over two organisations |
//! | Block dispatch | lc-04 | 1 block, M regex listeners |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lc_01_proposal::{CollectedResponses, NodeOutcome, ProposalResponse, ResponseStatus};
use lc_02_endorsement::{
    group, AgreeingThreshold, EndorsementEvaluator, PolicyDescriptor, PolicyEvaluator,
};
use lc_04_event_registry::{CallbackResult, EventRegistry, ListenerHandle};
use shared_types::{
    BlockEvent, ChaincodeEvent, ChannelId, ContractId, Digest, MspId, NodeId, TransactionEvent,
    TransactionId, ValidationCode,
};
use std::sync::Arc;
use std::time::Duration;

const POLICY: &str = r#"
identities:
  - user1: { role: { name: member, mspId: Org1MSP } }
  - user2: { role: { name: member, mspId: Org2MSP } }
policy:
  2-of:
    - signed-by: user1
    - signed-by: user2
"#;

fn response(index: usize, payload: &str) -> ProposalResponse {
    let org = if index % 2 == 0 { "Org1MSP" } else { "Org2MSP" };
    ProposalResponse {
        origin: NodeId::new(format!("peer{index}")),
        organization: MspId::new(org),
        tx_id: TransactionId("bench-tx".into()),
        status: ResponseStatus::SUCCESS,
        message: "OK".into(),
        payload: payload.as_bytes().to_vec(),
        rw_set_digest: Digest::of(payload.as_bytes()),
        contract: ContractId::new("example02", "v1", "github.com/example_cc"),
        signature: vec![0u8; 64],
        verified: true,
    }
}

fn collected(size: usize) -> CollectedResponses {
    CollectedResponses::new(
        TransactionId("bench-tx".into()),
        (0..size)
            .map(|i| NodeOutcome::Responded(response(i, "moved")))
            .collect(),
    )
}

// ============================================================================
// lc-02: Consistency grouping
// ============================================================================

fn bench_grouping(c: &mut Criterion) {
    let mut group_bench = c.benchmark_group("lc-02-consistency-grouping");

    for size in [4, 16, 64] {
        let agreeing: Vec<ProposalResponse> = (0..size).map(|i| response(i, "moved")).collect();
        let split: Vec<ProposalResponse> = (0..size)
            .map(|i| response(i, if i % 2 == 0 { "moved" } else { "stale" }))
            .collect();

        group_bench.throughput(Throughput::Elements(size as u64));
        group_bench.bench_with_input(BenchmarkId::new("agreeing", size), &agreeing, |b, r| {
            b.iter(|| black_box(group(r.iter())))
        });
        group_bench.bench_with_input(BenchmarkId::new("split", size), &split, |b, r| {
            b.iter(|| black_box(group(r.iter())))
        });
    }

    group_bench.finish();
}

// ============================================================================
// lc-02: Policy evaluation
// ============================================================================

fn bench_policy_evaluation(c: &mut Criterion) {
    let mut group_bench = c.benchmark_group("lc-02-policy-evaluation");
    let evaluator = PolicyEvaluator::new();

    for size in [4, 16, 64] {
        let responses = collected(size);
        let threshold = AgreeingThreshold::new(size);

        group_bench.throughput(Throughput::Elements(size as u64));
        group_bench.bench_with_input(
            BenchmarkId::new("agreeing_threshold", size),
            &responses,
            |b, r| b.iter(|| black_box(evaluator.evaluate(r, &threshold))),
        );
    }

    let descriptor = match PolicyDescriptor::parse(POLICY) {
        Ok(descriptor) => descriptor,
        Err(e) => panic!("benchmark policy must parse: {e}"),
    };
    let responses = collected(4);
    group_bench.bench_function("signature_policy_2_of", |b| {
        b.iter(|| black_box(evaluator.evaluate(&responses, descriptor.policy())))
    });

    group_bench.finish();
}

// ============================================================================
// lc-04: Block dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group_bench = c.benchmark_group("lc-04-block-dispatch");
    group_bench.measurement_time(Duration::from_secs(5));

    let channel = ChannelId::new("mychannel");
    let tx_id = TransactionId("bench-tx".into());
    let block = BlockEvent {
        channel: channel.clone(),
        block_number: 1,
        source: NodeId::new("peer0"),
        transactions: vec![TransactionEvent {
            tx_id: tx_id.clone(),
            validation_code: ValidationCode::Valid,
            chaincode_events: vec![ChaincodeEvent {
                tx_id,
                contract_name: "example02".into(),
                event_name: "evtsender".into(),
                payload: b"a->b:10".to_vec(),
            }],
        }],
    };

    for listeners in [1, 10, 100] {
        let registry = EventRegistry::new();
        for _ in 0..listeners {
            let registered = registry.register_chaincode_listener_regex(
                channel.clone(),
                "example.*",
                "evt.*",
                Arc::new(|_: &ListenerHandle, _: &BlockEvent, _: &ChaincodeEvent| -> CallbackResult {
                    Ok(())
                }),
            );
            if let Err(e) = registered {
                panic!("benchmark pattern must compile: {e}");
            }
        }

        group_bench.throughput(Throughput::Elements(listeners as u64));
        group_bench.bench_with_input(
            BenchmarkId::new("regex_listeners", listeners),
            &registry,
            |b, r| b.iter(|| black_box(r.dispatch(&block))),
        );
    }

    group_bench.finish();
}

criterion_group!(
    benches,
    bench_grouping,
    bench_policy_evaluation,
    bench_dispatch
);
criterion_main!(benches);
