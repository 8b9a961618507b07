use std::time::Duration;
use tundra::scripts::beryl_sorcerer::NPC_CAPTURED_BERYL_SORCERER;
use tundra::scripts::caribou_trap::NPC_NESINGWARY_TRAPPER;
use tundra::scripts::cannoneer::NPC_VALIANCE_KEEP_CANNONEER;
use tundra::scripts::hidden_cultist::SPELL_SHROUD_OF_THE_DEATH_CULTIST;
use tundra::scripts::last_rites::{say, NPC_LERYSSA, NPC_PRINCE_VALANAR, NPC_THASSARIAN};
use tundra::world::actor::{ActorRef, Effect, Faction};
use tundra::{Outcome, Scenario};

fn run(name: &str) -> Outcome {
    let scenario = Scenario::builtin(name).expect("builtin scenario");
    scenario.run(scenario.default_options()).expect("scenario run")
}

#[test]
fn caribou_trap_catches_the_trapper() {
    let outcome = run("caribou-trap");
    let player = outcome.labelled("player").expect("player");
    assert!(outcome.effects_of(player).any(|effect| *effect
        == Effect::KillCredit {
            player,
            entry: NPC_NESINGWARY_TRAPPER,
        }));
    assert!(outcome
        .effects
        .iter()
        .any(|record| record.entry == NPC_NESINGWARY_TRAPPER
            && record.effect == Effect::Talk { text: 0, target: Some(player) }));
    // The trapper is gone; the trap waits out its respawn next to the player.
    assert_eq!(outcome.actors_left, 2);
    let trap = outcome.labelled("trap").expect("trap");
    assert!(outcome.effects_of(trap).any(|effect| *effect == Effect::Custom("despawned")));
}

#[test]
fn last_rites_ends_in_the_reunion() {
    let outcome = run("last-rites");
    let player = outcome.labelled("player").expect("player");
    let thassarian = outcome.labelled("thassarian").expect("thassarian");

    assert!(outcome.effects_of(player).any(|effect| *effect
        == Effect::KillCredit {
            player,
            entry: NPC_PRINCE_VALANAR,
        }));
    let farewell = outcome
        .effects
        .iter()
        .find(|record| {
            record.actor == thassarian
                && record.effect
                    == Effect::Talk {
                        text: say::THASSARIAN_7,
                        target: None,
                    }
        })
        .map(|record| record.at)
        .expect("thassarian farewell");
    assert!(farewell > Duration::from_secs(95));
    assert!(outcome
        .effects
        .iter()
        .any(|record| record.entry == NPC_LERYSSA && matches!(record.effect, Effect::Talk { .. })));
    assert!(outcome
        .effects
        .iter()
        .all(|record| record.actor != thassarian || record.entry == NPC_THASSARIAN));
}

#[test]
fn hidden_cultists_turn_on_their_accuser() {
    let outcome = run("hidden-cultist");
    let player = outcome.labelled("player").expect("player");
    let tom = outcome.labelled("tom").expect("tom");
    let salty = outcome.labelled("salty").expect("salty");

    let attack_at = |cultist: ActorRef| {
        outcome
            .effects
            .iter()
            .find(|record| record.actor == cultist && record.effect == Effect::Attack(player))
            .map(|record| record.at)
    };
    assert_eq!(attack_at(tom), Some(Duration::from_secs(8)));
    assert_eq!(attack_at(salty), Some(Duration::from_secs(23)));

    // Tom is reset at the end and goes back into disguise.
    let last_faction = outcome
        .effects_of(tom)
        .filter_map(|effect| match effect {
            Effect::Faction(faction) => Some(*faction),
            _ => None,
        })
        .last();
    assert_eq!(last_faction, Some(Faction::Friendly));
    let shrouds = outcome
        .effects_of(tom)
        .filter(|effect| matches!(effect, Effect::Cast { spell, .. } if *spell == SPELL_SHROUD_OF_THE_DEATH_CULTIST))
        .count();
    assert_eq!(shrouds, 2);
}

#[test]
fn cannoneers_keep_firing() {
    let outcome = run("cannoneers");
    for cannon in ["east_cannon", "west_cannon"] {
        let cannon = outcome.labelled(cannon).expect("cannon");
        let shots = outcome.effects_of(cannon).count();
        assert!(shots >= 4, "{cannon} fired {shots} times");
    }
    assert!(outcome
        .effects
        .iter()
        .filter(|record| record.entry == NPC_VALIANCE_KEEP_CANNONEER)
        .all(|record| matches!(record.effect, Effect::Emote(_))));
}

#[test]
fn same_seed_same_outcome() {
    let first = run("cannoneers");
    let second = run("cannoneers");
    assert_eq!(first.effects, second.effects);
}

#[test]
fn command_line_entry_point() {
    let args = |values: &[&str]| values.iter().map(|value| value.to_string()).collect::<Vec<_>>();
    assert!(tundra::run(&args(&["tundra", "list"])).is_ok());
    assert!(tundra::run(&args(&["tundra", "caribou-trap", "5"])).is_ok());

    let err = tundra::run(&args(&["tundra"])).expect_err("usage");
    assert!(err.starts_with("usage: tundra"));
    let err = tundra::run(&args(&["tundra", "molten-core"])).expect_err("unknown");
    assert!(err.contains("molten-core"));
}

#[test]
fn every_builtin_scenario_runs_from_the_command_line() {
    for name in tundra::scenario::builtin_names() {
        let args = vec!["tundra".to_string(), name.to_string()];
        assert!(tundra::run(&args).is_ok(), "{name} failed");
    }
}

#[test]
fn beryl_sorcerer_is_chained_and_delivered() {
    let outcome = run("beryl-sorcerer");
    let player = outcome.labelled("player").expect("player");
    let sorcerer = outcome.labelled("sorcerer").expect("sorcerer");

    let credits: Vec<Duration> = outcome
        .effects
        .iter()
        .filter(|record| {
            record.effect
                == Effect::KillCredit {
                    player,
                    entry: NPC_CAPTURED_BERYL_SORCERER,
                }
        })
        .map(|record| record.at)
        .collect();
    assert_eq!(credits, vec![Duration::from_secs(3)]);
    assert!(outcome
        .effects_of(sorcerer)
        .any(|effect| *effect == Effect::Custom("follow_complete")));
    assert_eq!(outcome.actors_left, 2);
}
