//! Headless симуляция ARMORY
//!
//! Прогоняет сценарий без рендера: burst rifle с магазином, auto-aim на
//! ближайшую цель, перезарядка. Печатает события по тикам.

use bevy::prelude::*;

use armory_simulation::{
    create_headless_app, AimConfig, AimDirector, AimInput, AmmoPools, AutoAim, AutoAimConfig,
    OwnerFacing, ProjectileEmitter, ProjectileSpawnRequest, TargetEvent, Targetable,
    WeaponAction, WeaponAmmo, WeaponCommand, WeaponConfig, WeaponMount, WeaponNotification,
    WeaponOwner,
};

fn main() {
    let seed = 42;
    println!("Starting ARMORY headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.insert_resource(AmmoPools::new().with_pool("rifle", 12));

    let world = app.world_mut();
    let player = world
        .spawn((
            Transform::default(),
            OwnerFacing::right(),
            AimInput::default(),
        ))
        .id();

    let rifle = world
        .spawn((
            WeaponConfig::burst_rifle(),
            WeaponOwner(player),
            WeaponMount::new(Vec3::new(0.4, 0.0, 0.0)),
            WeaponAmmo::magazine(6, "rifle"),
            ProjectileEmitter {
                spawn_offset: Vec3::new(0.6, 0.0, 0.0),
                ..Default::default()
            }
            .with_spread(1, 2.0),
            AimDirector::planar(AimConfig::default()),
            AutoAim::new(AutoAimConfig::default()),
        ))
        .id();

    world.spawn((Transform::from_xyz(6.0, 2.0, 0.0), Targetable::default()));

    // Запускаем 300 тиков (5 секунд на 60Hz)
    for tick in 0..300u32 {
        if tick % 40 == 0 {
            app.world_mut().send_event(WeaponCommand::input(rifle, WeaponAction::FireStart));
            app.world_mut().send_event(WeaponCommand::input(rifle, WeaponAction::FireStop));
        }

        app.world_mut().run_schedule(FixedUpdate);

        for event in app.world_mut().resource_mut::<Events<TargetEvent>>().drain() {
            println!("Tick {}: target {:?}", tick, event.change);
        }
        for event in app.world_mut().resource_mut::<Events<WeaponNotification>>().drain() {
            println!("Tick {}: {:?} → {:?}", tick, event.kind, event.state);
        }
        for event in app.world_mut().resource_mut::<Events<ProjectileSpawnRequest>>().drain() {
            println!(
                "Tick {}: projectile at {:.2?} dir {:.2?}",
                tick, event.position, event.direction
            );
        }
    }

    let remaining = app
        .world()
        .resource::<AmmoPools>()
        .available(&"rifle".into())
        .unwrap_or(0);
    println!("Simulation complete! rifle pool: {}", remaining);
}
