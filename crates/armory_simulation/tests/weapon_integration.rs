//! Weapon integration tests
//!
//! Полный headless App: ArmoryPlugin + FixedUpdate, прогоняемый вручную
//! (один `run_schedule` = один тик 60Hz, без wall-clock).
//!
//! Проверяем:
//! - Магазин/перезарядка/burst/interrupt через события
//! - Charge и combo sequencers поверх обычных оружий
//! - Auto-aim → aim → направление выстрела
//! - Pause, lifecycle (equip/unequip/auto-destroy)

use bevy::prelude::*;
use armory_simulation::logger::{self, LogLevel, MemoryLogger};
use armory_simulation::*;

fn tick(app: &mut App, count: usize) {
    for _ in 0..count {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn drain<E: Event>(app: &mut App) -> Vec<E> {
    app.world_mut().resource_mut::<Events<E>>().drain().collect()
}

fn send<E: Event>(app: &mut App, event: E) {
    app.world_mut().send_event(event);
}

fn one_shot(app: &mut App, target: Entity) {
    send(app, WeaponCommand::input(target, WeaponAction::FireStart));
    send(app, WeaponCommand::input(target, WeaponAction::FireStop));
}

fn spawn_owner(app: &mut App, position: Vec3, facing: OwnerFacing) -> Entity {
    app.world_mut()
        .spawn((Transform::from_translation(position), facing))
        .id()
}

fn kinds(notifications: &[WeaponNotification], weapon: Entity) -> Vec<WeaponEventKind> {
    notifications
        .iter()
        .filter(|n| n.weapon == weapon)
        .map(|n| n.kind)
        .collect()
}

/// Test: 10 выстрелов из магазина на 10, 11-й → ReloadNeeded
#[test]
fn test_ten_shots_then_reload_needed() {
    let mut app = create_headless_app(42);
    app.insert_resource(AmmoPools::new().with_pool("9mm", 0));

    let owner = spawn_owner(&mut app, Vec3::ZERO, OwnerFacing::right());
    let pistol = app
        .world_mut()
        .spawn((
            WeaponConfig {
                auto_reload: false,
                ..WeaponConfig::pistol()
            },
            WeaponOwner(owner),
            WeaponAmmo::magazine(10, "9mm"),
            ProjectileEmitter::default(),
        ))
        .id();

    for _ in 0..10 {
        one_shot(&mut app, pistol);
        tick(&mut app, 40);
    }

    assert_eq!(drain::<ProjectileSpawnRequest>(&mut app).len(), 10);
    assert_eq!(
        app.world().get::<WeaponAmmo>(pistol).unwrap().loaded(),
        Some(0)
    );
    drain::<WeaponNotification>(&mut app);

    one_shot(&mut app, pistol);
    tick(&mut app, 3);

    let notifications = drain::<WeaponNotification>(&mut app);
    assert!(kinds(&notifications, pistol).contains(&WeaponEventKind::ReloadNeeded));
    assert!(drain::<ProjectileSpawnRequest>(&mut app).is_empty());
    assert_eq!(
        app.world().get::<WeaponAmmo>(pistol).unwrap().loaded(),
        Some(0)
    );
}

/// Test: burst = 3 spawn requests на одно нажатие, notification state = post-tick
#[test]
fn test_burst_through_scheduler() {
    let mut app = create_headless_app(42);
    let rifle = app
        .world_mut()
        .spawn((
            WeaponConfig::burst_rifle(),
            WeaponAmmo::magazine_infinite_reserve(30),
            ProjectileEmitter::default(),
        ))
        .id();

    one_shot(&mut app, rifle);
    tick(&mut app, 90);

    let spawns = drain::<ProjectileSpawnRequest>(&mut app);
    assert_eq!(spawns.len(), 3);
    assert!(spawns.iter().all(|spawn| spawn.weapon == rifle));

    let notifications = drain::<WeaponNotification>(&mut app);
    let fired = kinds(&notifications, rifle)
        .into_iter()
        .filter(|kind| *kind == WeaponEventKind::Fired)
        .count();
    assert_eq!(fired, 3);

    let stopped = notifications
        .iter()
        .find(|n| n.kind == WeaponEventKind::Stopped)
        .expect("burst stops");
    assert_eq!(stopped.state, WeaponState::Idle);

    assert_eq!(
        app.world().get::<WeaponAmmo>(rifle).unwrap().loaded(),
        Some(27)
    );
    assert!(app.world().resource::<TaskScheduler>().is_empty());
}

/// Test: interrupt посреди burst отменяет оставшиеся выстрелы
#[test]
fn test_interrupt_mid_burst() {
    let mut app = create_headless_app(42);
    let rifle = app
        .world_mut()
        .spawn((
            WeaponConfig::burst_rifle(),
            WeaponAmmo::magazine_infinite_reserve(30),
            ProjectileEmitter::default(),
        ))
        .id();

    one_shot(&mut app, rifle);
    tick(&mut app, 2);
    assert_eq!(drain::<ProjectileSpawnRequest>(&mut app).len(), 1);

    send(&mut app, WeaponCommand::authorized(rifle, WeaponAction::Interrupt));
    tick(&mut app, 60);

    assert!(drain::<ProjectileSpawnRequest>(&mut app).is_empty());
    let notifications = drain::<WeaponNotification>(&mut app);
    assert!(kinds(&notifications, rifle).contains(&WeaponEventKind::Interrupted));
    assert!(app.world().resource::<TaskScheduler>().is_empty());
    assert_eq!(
        app.world().get::<WeaponStateMachine>(rifle).unwrap().state,
        WeaponState::Idle
    );
}

/// Test: reload через команду, пул оплачивает магазин
#[test]
fn test_manual_reload_from_pool() {
    let mut app = create_headless_app(42);
    app.insert_resource(AmmoPools::new().with_pool("shells", 4));

    let shotgun = app
        .world_mut()
        .spawn((
            WeaponConfig {
                reload_time: 0.5,
                ..WeaponConfig::default()
            },
            WeaponAmmo::magazine(6, "shells").with_loaded(1),
            ProjectileEmitter::default().with_spread(5, 10.0),
        ))
        .id();

    send(&mut app, WeaponCommand::input(shotgun, WeaponAction::Reload));
    tick(&mut app, 40);

    let notifications = drain::<WeaponNotification>(&mut app);
    let shotgun_kinds = kinds(&notifications, shotgun);
    assert!(shotgun_kinds.contains(&WeaponEventKind::ReloadStarted));
    assert!(shotgun_kinds.contains(&WeaponEventKind::ReloadStopped));

    // 1 + 4 из пула (пул меньше чем нужно)
    assert_eq!(
        app.world().get::<WeaponAmmo>(shotgun).unwrap().loaded(),
        Some(5)
    );
    assert_eq!(app.world().resource::<AmmoPools>().available(&"shells".into()), Some(0));

    // Spread: 5 дробин на выстрел, все нормализованы
    one_shot(&mut app, shotgun);
    tick(&mut app, 3);
    let pellets = drain::<ProjectileSpawnRequest>(&mut app);
    assert_eq!(pellets.len(), 5);
    assert!(pellets
        .iter()
        .all(|pellet| (pellet.direction.length() - 1.0).abs() < 1e-4));
}

/// Test: charge weapon: release на последней ступени стреляет её оружием
#[test]
fn test_charge_release_fires_last_step() {
    let mut app = create_headless_app(42);

    let locked = WeaponConfig {
        input_authorized: false,
        ..WeaponConfig::pistol()
    };
    let weak = app
        .world_mut()
        .spawn((locked.clone(), ProjectileEmitter::default()))
        .id();
    let strong = app
        .world_mut()
        .spawn((locked, ProjectileEmitter::default()))
        .id();
    let charge = app
        .world_mut()
        .spawn(ChargeSequencer::new(vec![
            ChargeStep::new(weak, 1.0),
            ChargeStep::new(strong, 2.0),
        ]))
        .id();

    // Step weapons не принимают прямой input
    one_shot(&mut app, weak);
    tick(&mut app, 1);
    let notifications = drain::<WeaponNotification>(&mut app);
    assert!(kinds(&notifications, weak)
        .contains(&WeaponEventKind::Rejected(RejectReason::InputNotAuthorized)));

    send(&mut app, WeaponCommand::input(charge, WeaponAction::FireStart));
    tick(&mut app, 120);
    send(&mut app, WeaponCommand::input(charge, WeaponAction::FireStop));
    tick(&mut app, 5);

    let spawns = drain::<ProjectileSpawnRequest>(&mut app);
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].weapon, strong);

    let charge_events: Vec<ChargeEventKind> = drain::<ChargeEvent>(&mut app)
        .into_iter()
        .map(|event| event.kind)
        .collect();
    assert_eq!(
        charge_events,
        vec![
            ChargeEventKind::Started,
            ChargeEventKind::StepStarted(0),
            ChargeEventKind::StepCompleted(0),
            ChargeEventKind::StepStarted(1),
            ChargeEventKind::Released {
                index: Some(1),
                fired: true
            },
        ]
    );
}

/// Test: combo из 3 мечей: advance по Stopped, drop через 0.5s
#[test]
fn test_combo_advances_and_drops() {
    let mut app = create_headless_app(42);

    let swords: Vec<Entity> = (0..3)
        .map(|_| app.world_mut().spawn(WeaponConfig::sword()).id())
        .collect();
    let combo = app
        .world_mut()
        .spawn(ComboSequencer::new(swords.clone()).droppable(0.5))
        .id();

    one_shot(&mut app, combo);
    tick(&mut app, 40);

    let notifications = drain::<WeaponNotification>(&mut app);
    assert!(kinds(&notifications, swords[0]).contains(&WeaponEventKind::Fired));
    assert_eq!(app.world().get::<ComboSequencer>(combo).unwrap().index, 1);
    assert!(app.world().get::<WeaponStateMachine>(swords[1]).unwrap().active);
    assert!(!app.world().get::<WeaponStateMachine>(swords[0]).unwrap().active);
    assert!(!app.world().get::<WeaponStateMachine>(swords[2]).unwrap().active);

    // Melee window: open → close
    let windows: Vec<bool> = drain::<DamageAreaToggled>(&mut app)
        .into_iter()
        .map(|toggle| toggle.enabled)
        .collect();
    assert_eq!(windows, vec![true, false]);

    // Неактивный член combo отклоняет прямую команду
    one_shot(&mut app, swords[2]);
    tick(&mut app, 1);
    let notifications = drain::<WeaponNotification>(&mut app);
    assert!(kinds(&notifications, swords[2])
        .contains(&WeaponEventKind::Rejected(RejectReason::Inactive)));

    tick(&mut app, 60);

    let combo_events: Vec<ComboEventKind> = drain::<ComboEvent>(&mut app)
        .into_iter()
        .map(|event| event.kind)
        .collect();
    assert_eq!(
        combo_events,
        vec![ComboEventKind::Advanced { index: 1 }, ComboEventKind::Dropped]
    );
    assert_eq!(app.world().get::<ComboSequencer>(combo).unwrap().index, 0);
    assert!(app.world().get::<WeaponStateMachine>(swords[0]).unwrap().active);
}

/// Test: auto-aim выбирает ближайшую видимую цель и направляет выстрел
#[test]
fn test_auto_aim_steers_fire_direction() {
    let mut app = create_headless_app(42);

    let owner = spawn_owner(&mut app, Vec3::ZERO, OwnerFacing::right());
    let visible = app
        .world_mut()
        .spawn((Transform::from_xyz(3.0, 4.0, 0.0), Targetable::default()))
        .id();
    let _blocked = app
        .world_mut()
        .spawn((Transform::from_xyz(4.0, 0.0, 0.0), Targetable::default()))
        .id();
    let far = app
        .world_mut()
        .spawn((Transform::from_xyz(-6.0, 0.0, 0.0), Targetable::default()))
        .id();
    app.world_mut()
        .spawn((Transform::from_xyz(2.0, 0.0, 0.0), Occluder { radius: 0.5 }));

    let pistol = app
        .world_mut()
        .spawn((
            WeaponConfig::pistol(),
            WeaponOwner(owner),
            ProjectileEmitter::default(),
            AimDirector::planar(AimConfig::default()),
            AutoAim::new(AutoAimConfig::default()),
        ))
        .id();

    tick(&mut app, 1);
    let targets = drain::<TargetEvent>(&mut app);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].change, TargetChange::Found(visible));
    assert_eq!(targets[0].owner, Some(owner));

    one_shot(&mut app, pistol);
    tick(&mut app, 3);

    let spawns = drain::<ProjectileSpawnRequest>(&mut app);
    assert_eq!(spawns.len(), 1);
    assert!((spawns[0].direction - Vec3::new(0.6, 0.8, 0.0)).length() < 1e-3);

    // Цель исчезла → Lost сразу, следующий скан находит дальнюю видимую
    app.world_mut().despawn(visible);
    tick(&mut app, 1);
    let targets = drain::<TargetEvent>(&mut app);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].change, TargetChange::Lost(visible));
    assert!(app.world().get::<AimState>(pistol).unwrap().script_override.is_none());

    tick(&mut app, 15);
    let targets = drain::<TargetEvent>(&mut app);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].change, TargetChange::Found(far));
}

/// Test: pause замораживает всё, включая таймеры
#[test]
fn test_pause_freezes_weapons() {
    let mut app = create_headless_app(42);
    let pistol = app
        .world_mut()
        .spawn((WeaponConfig::pistol(), ProjectileEmitter::default()))
        .id();

    app.world_mut().resource_mut::<SimContext>().paused = true;
    one_shot(&mut app, pistol);
    tick(&mut app, 30);

    assert!(drain::<WeaponNotification>(&mut app).is_empty());
    assert_eq!(app.world().resource::<SimContext>().elapsed, 0.0);

    app.world_mut().resource_mut::<SimContext>().paused = false;
    tick(&mut app, 3);

    assert_eq!(drain::<ProjectileSpawnRequest>(&mut app).len(), 1);
}

/// Test: equip через событие + mount следует за владельцем
#[test]
fn test_equip_event_and_mount() {
    let mut app = create_headless_app(42);
    let owner = spawn_owner(&mut app, Vec3::new(1.0, 2.0, 0.0), OwnerFacing::left());

    send(
        &mut app,
        EquipWeapon::new(owner, WeaponConfig::pistol())
            .with_ammo(WeaponAmmo::magazine_infinite_reserve(8))
            .with_emitter(ProjectileEmitter::default())
            .with_mount(WeaponMount::new(Vec3::new(0.5, 0.0, 0.0))),
    );
    tick(&mut app, 1);

    let weapons: Vec<(Entity, WeaponOwner)> = app
        .world_mut()
        .query::<(Entity, &WeaponOwner)>()
        .iter(app.world())
        .map(|(entity, owner)| (entity, *owner))
        .collect();
    assert_eq!(weapons.len(), 1);
    let (pistol, held_by) = weapons[0];
    assert_eq!(held_by.0, owner);

    // Владелец смотрит влево → offset зеркалится
    let position = app.world().get::<Transform>(pistol).unwrap().translation;
    assert!((position - Vec3::new(0.5, 2.0, 0.0)).length() < 1e-5);

    one_shot(&mut app, pistol);
    tick(&mut app, 3);
    let spawns = drain::<ProjectileSpawnRequest>(&mut app);
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].owner, Some(owner));
    assert!((spawns[0].position - Vec3::new(0.5, 2.0, 0.0)).length() < 1e-5);
}

/// Test: recoil направлен против выстрела
#[test]
fn test_recoil_opposes_fire_direction() {
    let mut app = create_headless_app(42);
    let owner = spawn_owner(&mut app, Vec3::ZERO, OwnerFacing::right());
    let pistol = app
        .world_mut()
        .spawn((
            WeaponConfig::pistol(),
            WeaponOwner(owner),
            ProjectileEmitter::default(),
        ))
        .id();

    one_shot(&mut app, pistol);
    tick(&mut app, 3);

    let recoils = drain::<RecoilApplied>(&mut app);
    assert_eq!(recoils.len(), 1);
    assert_eq!(recoils[0].owner, owner);
    assert!((recoils[0].force - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
}

/// Test: unequip возвращает патроны в пул и удаляет оружие
#[test]
fn test_unequip_returns_ammo() {
    let mut app = create_headless_app(42);
    app.insert_resource(AmmoPools::new().with_pool("9mm", 5));

    let pistol = app
        .world_mut()
        .spawn((
            WeaponConfig::pistol(),
            WeaponAmmo::magazine(10, "9mm"),
            ProjectileEmitter::default(),
        ))
        .id();

    for _ in 0..3 {
        one_shot(&mut app, pistol);
        tick(&mut app, 40);
    }
    assert_eq!(
        app.world().get::<WeaponAmmo>(pistol).unwrap().loaded(),
        Some(7)
    );
    drain::<WeaponNotification>(&mut app);

    send(&mut app, UnequipWeapon { weapon: pistol });
    tick(&mut app, 1);

    assert_eq!(app.world().resource::<AmmoPools>().available(&"9mm".into()), Some(12));
    assert!(app.world().get::<WeaponConfig>(pistol).is_none());
    let notifications = drain::<WeaponNotification>(&mut app);
    assert_eq!(kinds(&notifications, pistol), vec![WeaponEventKind::Unequipped]);
}

/// Test: re-equip сбрасывает оружие в Idle
#[test]
fn test_reequip_resets_machine() {
    let mut app = create_headless_app(42);
    let pistol = app
        .world_mut()
        .spawn((
            WeaponConfig::pistol(),
            WeaponAmmo::magazine_infinite_reserve(10).with_loaded(0),
        ))
        .id();

    send(&mut app, WeaponCommand::input(pistol, WeaponAction::Reload));
    tick(&mut app, 5);
    assert!(app.world().get::<WeaponStateMachine>(pistol).unwrap().is_reloading());

    send(&mut app, ReequipWeapon { weapon: pistol });
    tick(&mut app, 1);

    let machine = app.world().get::<WeaponStateMachine>(pistol).unwrap();
    assert_eq!(machine.state, WeaponState::Idle);
    assert!(!machine.is_reloading());
    let notifications = drain::<WeaponNotification>(&mut app);
    assert!(kinds(&notifications, pistol).contains(&WeaponEventKind::Reinitialized));
}

/// Test: граната с пулом на 1: бросок, затем auto-destroy
#[test]
fn test_auto_destroy_when_pool_runs_dry() {
    let mut app = create_headless_app(42);
    app.insert_resource(AmmoPools::new().with_pool("grenade", 1));

    let grenade = app
        .world_mut()
        .spawn((
            WeaponConfig::grenade(),
            WeaponAmmo::pool("grenade"),
            ProjectileEmitter::default(),
        ))
        .id();

    send(&mut app, WeaponCommand::input(grenade, WeaponAction::FireStart));
    tick(&mut app, 30);
    assert_eq!(drain::<ProjectileSpawnRequest>(&mut app).len(), 1);
    assert!(app.world().get::<WeaponConfig>(grenade).is_some());

    tick(&mut app, 40);

    assert!(app.world().get::<WeaponConfig>(grenade).is_none());
    let notifications = drain::<WeaponNotification>(&mut app);
    let grenade_kinds = kinds(&notifications, grenade);
    assert!(grenade_kinds.contains(&WeaponEventKind::DestroyScheduled));
    assert!(grenade_kinds.contains(&WeaponEventKind::Destroyed));
}

/// Test: projectile weapon без emitter → warning, без spawn
#[test]
fn test_missing_emitter_warns() {
    let mut app = create_headless_app(42);
    let memory = MemoryLogger::new();
    logger::set_logger(Box::new(memory.clone()));

    let pistol = app.world_mut().spawn(WeaponConfig::pistol()).id();

    one_shot(&mut app, pistol);
    tick(&mut app, 3);

    assert!(drain::<ProjectileSpawnRequest>(&mut app).is_empty());
    let notifications = drain::<WeaponNotification>(&mut app);
    assert!(kinds(&notifications, pistol).contains(&WeaponEventKind::Fired));
    assert!(memory.contains(LogLevel::Warning, "without ProjectileEmitter"));
}

/// Test: interrupt в тот же тик, когда burst sub-shot должен выстрелить
#[test]
fn test_interrupt_on_sub_shot_tick() {
    let mut app = create_headless_app(42);
    let rifle = app
        .world_mut()
        .spawn((
            WeaponConfig::burst_rifle(),
            WeaponAmmo::magazine_infinite_reserve(30),
            ProjectileEmitter::default(),
        ))
        .id();

    one_shot(&mut app, rifle);
    tick(&mut app, 2);
    assert_eq!(drain::<ProjectileSpawnRequest>(&mut app).len(), 1);

    // Следующий sub-shot через 0.08s: пятый тик после первого выстрела
    tick(&mut app, 4);
    send(&mut app, WeaponCommand::authorized(rifle, WeaponAction::Interrupt));
    tick(&mut app, 1);

    assert!(drain::<ProjectileSpawnRequest>(&mut app).is_empty());
    let notifications = drain::<WeaponNotification>(&mut app);
    assert_eq!(
        kinds(&notifications, rifle),
        vec![
            WeaponEventKind::Started,
            WeaponEventKind::Fired,
            WeaponEventKind::Interrupted,
            WeaponEventKind::Stopped,
        ]
    );

    tick(&mut app, 30);
    assert!(drain::<ProjectileSpawnRequest>(&mut app).is_empty());
}

/// Test: interrupt пока оружие в ReloadNeeded не глотает уведомление
#[test]
fn test_interrupt_while_reload_needed() {
    let mut app = create_headless_app(42);
    app.insert_resource(AmmoPools::new().with_pool("9mm", 0));

    let pistol = app
        .world_mut()
        .spawn((
            WeaponConfig {
                auto_reload: false,
                ..WeaponConfig::pistol()
            },
            WeaponAmmo::magazine(10, "9mm").with_loaded(0),
            ProjectileEmitter::default(),
        ))
        .id();

    one_shot(&mut app, pistol);
    tick(&mut app, 1);
    assert_eq!(
        app.world().get::<WeaponStateMachine>(pistol).unwrap().state,
        WeaponState::ReloadNeeded
    );

    send(&mut app, WeaponCommand::authorized(pistol, WeaponAction::Interrupt));
    tick(&mut app, 2);

    let notifications = drain::<WeaponNotification>(&mut app);
    assert_eq!(
        kinds(&notifications, pistol),
        vec![WeaponEventKind::Started, WeaponEventKind::ReloadNeeded]
    );
}

/// Test: drop countdown combo отсчитывает полный drop_delay после Stopped
#[test]
fn test_combo_drop_waits_full_delay() {
    let mut app = create_headless_app(42);

    let swords: Vec<Entity> = (0..2)
        .map(|_| app.world_mut().spawn(WeaponConfig::sword()).id())
        .collect();
    // 0.05s = 3 тика на 60Hz
    app.world_mut()
        .spawn(ComboSequencer::new(swords.clone()).droppable(0.05));

    one_shot(&mut app, swords[0]);

    let mut advanced_at = None;
    let mut dropped_at = None;
    for n in 0..60 {
        tick(&mut app, 1);
        for event in drain::<ComboEvent>(&mut app) {
            match event.kind {
                ComboEventKind::Advanced { .. } => advanced_at = Some(n),
                ComboEventKind::Dropped => dropped_at = Some(n),
            }
        }
    }

    let advanced_at = advanced_at.expect("combo advanced");
    let dropped_at = dropped_at.expect("combo dropped");
    assert_eq!(dropped_at - advanced_at, 3);
}
