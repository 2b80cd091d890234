//! Property tests over whole ships: conservation through a converter chain
//! and capacity bounds under arbitrary part sizes.

use proptest::prelude::*;
use shipflow_core::fixed::Fixed64;
use shipflow_core::test_utils::fixed;
use shipflow_data::{Format, parse_rate_table};
use shipflow_parts::{Ship, TankKind};

fn rates(conversion_rate: u8, draw_rate: u8) -> String {
    format!(
        r#"(
            items: [(name: "fuel", conversion_rate: {conversion_rate}.0, draw_rate: {draw_rate}.0)],
            storage: [(name: "tank", capacity_per_volume: 10.0)],
            scheduler: Some((tick_seconds: 1.0)),
        )"#
    )
}

proptest! {
    #[test]
    fn converter_chain_conserves_and_clamps(
        conversion_rate in 1u8..=8,
        draw_rate in 1u8..=4,
        source_volume in 1u8..=20,
        sink_volume in 1u8..=20,
        reactor_volume in 1u8..=4,
        ticks in 1u32..=30,
    ) {
        let table = parse_rate_table(&rates(conversion_rate, draw_rate), Format::Ron).unwrap();
        let mut ship = Ship::new(table).unwrap();
        let (_, source) = ship
            .add_tank("source", TankKind::Fuel, "tank", Fixed64::from_num(source_volume))
            .unwrap();
        let (_, sink) = ship
            .add_tank("sink", TankKind::Energy, "tank", Fixed64::from_num(sink_volume))
            .unwrap();
        let initial = source.container().quantity_max();
        let _ = source.container().add_quantity(initial, false);
        ship.add_converter(
            "reactor",
            "fuel",
            Some(source.provider()),
            Some(sink.provider()),
            Fixed64::from_num(reactor_volume),
        )
        .unwrap();

        for _ in 0..ticks {
            ship.advance(fixed(1.0));
        }

        let drawn = initial - source.level();
        let produced = drawn * Fixed64::from_num(conversion_rate);
        prop_assert!(source.level() >= Fixed64::ZERO);
        prop_assert!(sink.level() <= sink.container().quantity_max());
        prop_assert_eq!(sink.level(), produced.min(sink.container().quantity_max()));

        let per_tick = Fixed64::from_num(draw_rate) * Fixed64::from_num(reactor_volume);
        prop_assert_eq!(drawn, (per_tick * Fixed64::from_num(ticks)).min(initial));
    }
}
