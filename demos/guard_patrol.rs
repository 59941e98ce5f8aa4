//! Guard Patrol
//!
//! This example drives an NPC guard through a two-level machine.
//!
//! Key concepts:
//! - A nested combat machine that only ticks while it is selected
//! - ANY transitions that pre-empt whatever the guard is doing
//! - Guards reading a shared world context
//! - Transitions chaining within a single tick
//!
//! Run with: cargo run --example guard_patrol

use hfsm::builder::{guarded_transition, simple_transition};
use hfsm::{Callbacks, MachineBuilder, ANY, ENTER};
use std::time::Duration;

#[derive(Debug, Default)]
struct World {
    health: i32,
    enemy_distance: f32,
    patrol_meters: f32,
    shots_fired: u32,
}

fn main() {
    println!("=== Guard Patrol ===\n");

    let combat = MachineBuilder::new("combat")
        .on_enter(|prev, _: &mut World| println!("  [combat] engaging (was {prev})"))
        .on_exit(|next, _: &mut World| println!("  [combat] disengaging (going to {next})"))
        .state(
            "chase",
            Callbacks::new().on_update(|dt, w: &mut World| {
                w.enemy_distance -= 4.0 * dt.as_secs_f32();
            }),
        )
        .state(
            "shoot",
            Callbacks::new().on_update(|_, w: &mut World| w.shots_fired += 1),
        )
        .transitions(vec![
            simple_transition(ENTER, "chase"),
            guarded_transition("chase", "shoot", |w: &World| w.enemy_distance < 5.0),
            guarded_transition("shoot", "chase", |w: &World| w.enemy_distance >= 5.0),
        ])
        .build()
        .unwrap();

    let mut guard = MachineBuilder::new("guard")
        .context(World {
            health: 3,
            enemy_distance: 30.0,
            ..Default::default()
        })
        .state(
            "patrol",
            Callbacks::new()
                .on_enter(|_, _: &mut World| println!("  [guard] starting patrol"))
                .on_update(|dt, w: &mut World| w.patrol_meters += 1.5 * dt.as_secs_f32()),
        )
        .machine(combat)
        .state(
            "dead",
            Callbacks::new().on_enter(|prev, _: &mut World| println!("  [guard] fell while in {prev}")),
        )
        .transition(ENTER, "patrol")
        .guarded("patrol", "combat", |w: &World| w.enemy_distance < 20.0)
        .guarded("combat", "patrol", |w: &World| w.enemy_distance >= 20.0)
        .guarded(ANY, "dead", |w: &World| w.health <= 0)
        .build()
        .unwrap();

    let dt = Duration::from_millis(500);
    for tick in 1..=16 {
        {
            let mut world = guard.context_mut().unwrap();
            world.enemy_distance -= 2.0;
            if tick == 14 {
                world.health = 0;
            }
        }

        guard.update(dt).unwrap();

        let inner = guard
            .get("combat")
            .and_then(|n| n.as_machine())
            .filter(|_| guard.current_name() == "combat")
            .map(|m| format!(" / {}", m.current_name()))
            .unwrap_or_default();
        println!("tick {tick:2}: {}{inner}", guard.current_name());
    }

    println!("\nFinal world: {:?}", *guard.context().unwrap());

    println!("\nState changes of the guard machine:");
    for record in guard.history().records() {
        println!("  {} -> {}", record.from, record.to);
    }

    println!("\n=== Example Complete ===");
}
