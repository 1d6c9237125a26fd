//! Performance Benchmarks for the Head Protocol Core
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use isthmus::head::{snapshot, transition, Commitment, Eta, HeadParameters, HeadState, Input, Xi};
use isthmus::ledger::{KeyHash, MintValue, OutputRef, PolicyId, Transaction, TxOut, UtxoSet, Value};
use isthmus::multisig::{AggregateKey, SigningKey};

fn keys(n: usize) -> Vec<SigningKey> {
    (0..n)
        .map(|i| SigningKey::from_seed([0xD0 + i as u8; 32]))
        .collect()
}

fn params_for(keys: &[SigningKey]) -> HeadParameters {
    HeadParameters::new(
        keys.iter().map(|k| k.verification_key()).collect(),
        PolicyId([3u8; 32]),
        Duration::from_secs(600),
    )
}

fn utxos(n: usize) -> UtxoSet {
    let mut set = UtxoSet::new();
    for i in 0..n {
        set.insert(
            OutputRef::new([i as u8; 32], 0),
            TxOut::to_key(KeyHash([i as u8; 32]), Value::coin(10 + i as u64)),
        );
    }
    set
}

// =============================================================================
// SNAPSHOT ENGINE BENCHMARKS
// =============================================================================

fn bench_close_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("close_verification");

    for n in [2usize, 5, 10] {
        let keys = keys(n);
        let vks: Vec<_> = keys.iter().map(|k| k.verification_key()).collect();
        let aggregate = AggregateKey::aggregate(&vks).unwrap();
        let set = utxos(8);
        let eta = Eta {
            utxos: set.clone(),
            seq: 0,
            transactions: vec![],
        };
        let xi = Xi {
            utxos: set.clone(),
            seq: 4,
            snapshot_signature: Some(snapshot::sign_snapshot(&keys, &set, 4).unwrap()),
            transactions: vec![],
        };

        group.bench_with_input(BenchmarkId::from_parameter(n), &xi, |b, xi| {
            b.iter(|| snapshot::close(&aggregate, &eta, xi).unwrap())
        });
    }

    group.finish();
}

fn bench_transaction_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction_fold");

    for len in [1usize, 10, 50] {
        let set = utxos(1);
        // A chain of transfers, each spending the previous output
        let mut transactions = Vec::with_capacity(len);
        let mut input = OutputRef::new([0u8; 32], 0);
        let coin = 10;
        for i in 0..len {
            let tx = Transaction {
                inputs: vec![input],
                outputs: vec![TxOut::to_key(KeyHash([i as u8; 32]), Value::coin(coin))],
                mint: MintValue::none(),
            };
            input = tx.output_ref(0);
            transactions.push(tx);
        }

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &transactions, |b, txs| {
            b.iter(|| set.apply_transactions(txs).unwrap())
        });
    }

    group.finish();
}

// =============================================================================
// TRANSITION FUNCTION BENCHMARKS
// =============================================================================

fn bench_collect_com(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_com");

    for n in [2usize, 5, 10] {
        let keys = keys(n);
        let params = params_for(&keys);
        let commitments: Vec<Commitment> = (0..n)
            .map(|i| Commitment {
                participant: params.participants[i].clone(),
                lock: OutputRef::new([0x10 + i as u8; 32], 0),
                fragment: (
                    OutputRef::new([0x20 + i as u8; 32], 0),
                    TxOut::to_key(KeyHash([i as u8; 32]), Value::coin(5)),
                ),
            })
            .collect();
        let input = Input::CollectCom { commitments };

        group.bench_with_input(BenchmarkId::from_parameter(n), &input, |b, input| {
            b.iter(|| transition(&params, &HeadState::Collecting, input).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_close_verification,
    bench_transaction_fold,
    bench_collect_com
);
criterion_main!(benches);
