use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use tally_accounting::LedgerEntry;
use tally_core::{AccountClass, AccountIdentity, Version};
use tally_infra::balance_query::statement::render_round_trip_sql;
use tally_infra::balance_query::{build_statements, BalanceRepository, InMemoryLedger};

fn account(n: usize) -> AccountIdentity {
    AccountIdentity::new(AccountClass::Liability, "clients", "available", format!("acc-{n}"))
}

/// Ledger with `accounts` accounts, each holding `entries_per_account` alternating movements.
fn seeded_ledger(accounts: usize, entries_per_account: u64) -> Arc<InMemoryLedger> {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut entries = Vec::with_capacity(accounts * entries_per_account as usize);
    for n in 0..accounts {
        for v in 1..=entries_per_account {
            let entry = if v % 2 == 0 {
                LedgerEntry::debit(account(n), 10, Version::new(v))
            } else {
                LedgerEntry::credit(account(n), 25, Version::new(v))
            };
            entries.push(entry);
        }
    }
    ledger.append(entries).expect("seed entries");
    ledger
}

fn bench_statement_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_rendering");

    for batch_size in [1usize, 10, 100, 1000].iter() {
        let accounts: Vec<_> = (0..*batch_size).map(account).collect();
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("render_round_trip_sql", batch_size),
            &accounts,
            |b, accounts| {
                b.iter(|| {
                    let batch = build_statements(black_box(accounts));
                    black_box(render_round_trip_sql(batch.statements()))
                });
            },
        );
    }

    group.finish();
}

fn bench_in_memory_batch(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");

    let mut group = c.benchmark_group("in_memory_batch");
    let ledger = seeded_ledger(200, 20);
    let repository = BalanceRepository::new(ledger);

    for batch_size in [1usize, 10, 100].iter() {
        // Every fourth requested account has no entries.
        let accounts: Vec<_> = (0..*batch_size)
            .map(|n| if n % 4 == 3 { account(10_000 + n) } else { account(n) })
            .collect();

        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("get_batch_account_balance", batch_size),
            &accounts,
            |b, accounts| {
                b.iter(|| {
                    let balances = runtime
                        .block_on(repository.get_batch_account_balance(black_box(accounts), None))
                        .expect("batch read");
                    black_box(balances)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_statement_rendering, bench_in_memory_batch);
criterion_main!(benches);
