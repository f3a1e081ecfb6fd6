use serde::{Deserialize, Serialize};
use stress_test::{stress_test_checkpointing, stress_test_history};
use trellis_sdk::prelude::*;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Counter {
    counter: i64,
    message: String,
}

fn increment(state: &Counter, _: &[String]) -> Counter {
    Counter {
        counter: state.counter + 1,
        ..state.clone()
    }
}

fn change_message(state: &Counter, args: &[String]) -> Counter {
    Counter {
        message: args.first().cloned().unwrap_or_default(),
        ..state.clone()
    }
}

fn main() {
    demo();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };
    rt.block_on(async_main());
}

fn demo() {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║            PROVENANCE DEMO                                  ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let provenance = Provenance::new(Counter::default());
    let subscription = provenance.subscribe(|event| println!("  event: {event:?}"));
    let result = run_demo(&provenance);
    subscription.unsubscribe();

    if let Err(err) = result {
        eprintln!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn run_demo(provenance: &Provenance<Counter>) -> trellis_sdk::Result<()> {
    let inc = Action::new(increment).set_label("Increment Counter");
    let say = Action::new(change_message).set_label("Change Message");

    provenance.apply(&inc)?;
    provenance.apply(&inc)?;
    let branch_point = provenance.current_id();
    provenance.apply(&say.clone().set_args(["hello".to_string()]))?;

    // Branch off the second increment
    provenance.move_to(&branch_point)?;
    provenance.apply(&say.set_args(["goodbye".to_string()]))?;

    println!("\n  current state: {:?}", provenance.current_state()?);
    provenance.undo()?;
    println!("  after undo:    {:?}", provenance.current_state()?);

    let stats = provenance.read(|g| g.stats());
    println!(
        "  {} nodes, {} leaves, {} branch points",
        stats.total_nodes, stats.leaf_count, stats.branch_points
    );

    if let Err(err) = provenance.apply(&Action::new(increment)) {
        println!("  unlabeled action rejected: {err}");
    }
    Ok(())
}

async fn async_main() {
    if let Err(err) = run_stress_tests().await {
        eprintln!("stress test failed: {err}");
        std::process::exit(1);
    }
    println!("\n✓ All stress tests completed successfully!");
}

async fn run_stress_tests() -> trellis_sdk::Result<()> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            HISTORY STRESS TESTS                             ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: small history, diffs only
    let stats = stress_test_history(500, None, 4).await?;
    stats.print();

    // Test 2: small history, checkpointed
    let stats = stress_test_history(500, Some(16), 4).await?;
    stats.print();

    // Test 3: larger history with more readers
    let stats = stress_test_history(5000, Some(32), 8).await?;
    stats.print();

    // Test 4: checkpoint interval analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          CHECKPOINT ANALYSIS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_checkpointing(2000, &[1, 4, 16, 64, 256]).await
}
