//! # Contesa - Concurrency-Control Strategies Under Contention
//!
//! A benchmark harness answering one question: when many workers increment
//! the same counter in a shared, network-accessible store, **which
//! coordination strategy gives the right answer, and what does it cost?**
//!
//! ## The Problem
//!
//! "Read the value, write the value plus one" is correct for one worker and
//! wrong for two: both can read `v`, both write `v + 1`, and one increment is
//! lost. Stores offer several ways out, each with its own price:
//!
//! | Strategy | How it stays correct | What it costs |
//! |----------|----------------------|---------------|
//! | No lock (control) | it doesn't | nothing, except lost updates |
//! | Pessimistic lock | exclusive key lock around read/write | 4 round trips, all workers serialized |
//! | Optimistic CAS | conditional replace, retried on conflict | retries grow with contention |
//! | Atomic primitive | the store adds for you | 1 round trip, or fewer with batching |
//!
//! ## How a Run Works
//!
//! ```text
//! Benchmark ──for each strategy──► reset counter to 0
//!                                  │
//!                                  ▼
//!                       Scenario::run (timed)
//!                                  │
//!                     run_concurrently(T workers)
//!                 ┌────────┬───────┴───────┬────────┐
//!                 ▼        ▼               ▼        ▼
//!             worker-0  worker-1   ...  worker-T-1      each: P increments
//!                 └────────┴───────┬───────┴────────┘      via CounterStore
//!                                  ▼
//!                     read counter, compare with T × P
//!                                  │
//!                                  ▼
//!                            ScenarioResult
//! ```
//!
//! Scenarios run one at a time against the same store and the same
//! [`Settings`](settings::Settings), so their timings are comparable.
//!
//! ## Quick Start
//!
//! ```rust
//! use contesa::driver::Benchmark;
//! use contesa::report::format_line;
//! use contesa::settings::Settings;
//! use contesa::store::{MemoryStore, StoreConfig};
//!
//! let store = MemoryStore::connect(StoreConfig::default())?;
//! let bench = Benchmark::new(&store, Settings::new(4, 1000))?;
//!
//! for result in bench.run()? {
//!     println!("{}", format_line(&result));
//! }
//! # Ok::<(), contesa::error::BenchError>(())
//! ```
//!
//! ## Correctness vs. Failure
//!
//! A counter that ends short of `T × P` is a *result* (`passed == false`),
//! which is exactly what the no-lock control is there to show. A store call
//! that fails is an *error* ([`BenchError`](error::BenchError)) and aborts the
//! run.
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `table` | [`report::table`] summary tables |
//! | `json` | [`report::json`] JSON reports (implies `serde`) |
//! | `serde` | `Serialize`/`Deserialize` on settings and results |
//! | `cli` (default) | the `contesa` binary |

pub mod driver;
pub mod error;
pub mod pool;
pub mod report;
pub mod scenario;
pub mod settings;
pub mod store;
pub mod strategy;
pub mod tally;
