use anyhow::Result;
use log::{info, warn};
use rand::Rng;
use skill_system::config::SETTING;
use skill_system::{
    ActorStats, EffectEnv, EffectRegistry, EventBus, MotionDriver, ProjectileEngine,
    ResourceProvider, SimWorld, SkillActivator, SkillCatalog, SkillContext, SkillEvent,
    SkillInventory, SkillPointProvider, SkillRequest, WorldAccess,
};
use std::thread;
use std::time::Duration;
use vek::Vec2;

/// 目錄檔缺失時使用的內建示範目錄
const BUILTIN_CATALOG: &str = r#"{
    // 直線火球，帶小幅扇形齊射的升級層
    "fireball": {
        "name": "火球",
        "base_cooldown": 2.0,
        "base_cost": 10.0,
        "cast_vfx": "cast_flash",
        "effects": [{ "kind": "projectile_burst", "damage": 20.0, "speed": 10.0, "archetype": "fireball" }],
        "max_level": 3,
        "tiers": [
            { "modifications": [] },
            { "modifications": [{ "key": "damage", "additive": 10.0 }] },
            { "modifications": [
                { "key": "damage", "additive": 10.0 },
                { "key": "projectileCount", "override_base": true, "override_value": 3.0 },
                { "key": "cooldownReduction", "additive": 0.25 }
            ] }
        ]
    },
    /* 短距離衝刺，位移結束後保留一小段無敵 */
    "shadow_dash": {
        "name": "暗影衝刺",
        "base_cooldown": 4.0,
        "base_cost": 15.0,
        "effects": [{ "kind": "dash", "distance": 5.0, "duration": 0.2, "invulnerability_time": 0.5 }]
    }
}"#;

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn main() -> Result<()> {
    setup_logger()?;
    let setting = SETTING.clone();
    info!("skillsim 啟動: {:?}", setting);

    // 目錄
    let registry = EffectRegistry::with_builtin();
    let mut catalog = SkillCatalog::new();
    match catalog.load_file(&setting.catalog_path, &registry) {
        Ok(count) => info!("載入技能目錄 {}: {} 筆", setting.catalog_path, count),
        Err(e) => {
            warn!("無法載入 {}: {}，改用內建目錄", setting.catalog_path, e);
            catalog.load_json_str(BUILTIN_CATALOG, &registry)?;
        }
    }
    catalog.validate()?;

    // 模擬情境
    let mut world = SimWorld::new();
    let caster = world.spawn_actor(Vec2::zero(), 100.0);
    let dummy = world.spawn_actor(Vec2::new(6.0, 0.0), 500.0);

    let bus: EventBus<SkillEvent> = EventBus::new();
    let event_rx = bus.subscribe();

    let mut stats = ActorStats::new(60.0, 4.0);
    stats.add_points(5);

    let mut inventory = SkillInventory::new(caster, setting.max_slots);
    for (_, config) in catalog.iter() {
        inventory.add_skill(config.clone());
    }
    inventory.try_unlock("fireball", &mut stats, &bus);
    inventory.try_level_up("fireball", &mut stats, &bus);
    inventory.try_unlock("shadow_dash", &mut stats, &bus);
    inventory.try_assign_slot("fireball", 0);
    inventory.try_assign_slot("shadow_dash", 1);

    let activator = SkillActivator::new(setting.global_cooldown);
    let mut motions = MotionDriver::new();
    let mut projectiles = ProjectileEngine::new();
    projectiles.prewarm("fireball", 8);

    // 指令執行緒
    let (tx, command_rx) = crossbeam_channel::unbounded::<String>();
    thread::spawn(move || loop {
        let mut buffer = String::new();
        if std::io::stdin().read_line(&mut buffer).is_err() {
            break;
        }
        if tx.send(buffer.trim().to_string()).is_err() {
            break;
        }
    });

    let dt = 1.0 / setting.tps as f32;
    let total_ticks = (setting.run_seconds * setting.tps as f32) as u64;
    let mut rng = rand::rng();

    let mut tick: u64 = 0;
    'sim: while tick < total_ticks {
        tick += 1;

        // 外部指令
        for command in command_rx.try_iter() {
            match command.as_str() {
                "quit" => break 'sim,
                line if line.starts_with("cast ") => {
                    let skill_id = line.trim_start_matches("cast ");
                    let request = SkillRequest::unit_cast(caster, skill_id, dummy);
                    try_cast(
                        &request, &activator, &mut inventory, &mut stats, &mut world,
                        &mut motions, &mut projectiles, &bus,
                    );
                }
                "" => {}
                other => info!("未知指令: {}", other),
            }
        }

        // 幀推進
        stats.update(dt);
        inventory.tick(dt, &bus);
        motions.advance(&mut world, dt);
        projectiles.advance(&mut world, dt);

        // 腳本化施放：偶爾丟火球、偶爾衝刺
        if rng.random_bool(0.15) {
            let request = SkillRequest::unit_cast(caster, "fireball", dummy);
            try_cast(
                &request, &activator, &mut inventory, &mut stats, &mut world, &mut motions,
                &mut projectiles, &bus,
            );
        }
        if rng.random_bool(0.03) {
            let request = SkillRequest::unit_cast(caster, "shadow_dash", dummy);
            try_cast(
                &request, &activator, &mut inventory, &mut stats, &mut world, &mut motions,
                &mut projectiles, &bus,
            );
        }

        for event in event_rx.try_iter() {
            match event {
                SkillEvent::SkillActivated { skill_id, level, .. } => {
                    info!("發動 {} (等級 {})", skill_id, level)
                }
                SkillEvent::SkillReady { skill_id, .. } => info!("{} 冷卻完畢", skill_id),
                SkillEvent::CastFx { vfx, sound, .. } => {
                    info!("表現提示 vfx={:?} sound={:?}", vfx, sound)
                }
                _ => {}
            }
        }

        if setting.realtime {
            spin_sleep::sleep(Duration::from_secs_f32(dt));
        }
    }

    info!(
        "模擬結束: {} 幀，木樁剩餘生命 {:?}，法力 {:.1}/{:.1}",
        tick,
        world.health(dummy),
        stats.current(),
        stats.maximum(),
    );
    Ok(())
}

/// 依請求內容解出瞄準方向後嘗試發動
fn try_cast(
    request: &SkillRequest,
    activator: &SkillActivator,
    inventory: &mut SkillInventory,
    stats: &mut ActorStats,
    world: &mut SimWorld,
    motions: &mut MotionDriver,
    projectiles: &mut ProjectileEngine,
    bus: &EventBus<SkillEvent>,
) -> bool {
    let caster_pos = match world.get_position(request.caster) {
        Some(pos) => pos,
        None => return false,
    };
    let aim = request
        .target_pos
        .or_else(|| request.target_entity.and_then(|t| world.get_position(t)));
    let direction = match aim {
        Some(pos) if pos != caster_pos => (pos - caster_pos).normalized(),
        _ => Vec2::new(1.0, 0.0),
    };

    let skill = match inventory.get_mut(&request.skill_id) {
        Some(skill) => skill,
        None => {
            warn!("技能欄裡沒有 {}", request.skill_id);
            return false;
        }
    };

    let mut ctx = SkillContext::new(request.caster, caster_pos, direction);
    if let Some(pos) = request.target_pos {
        ctx = ctx.with_target_pos(pos);
    }
    if let Some(target) = request.target_entity {
        ctx = ctx.with_target_entity(target);
    }
    let mut env = EffectEnv {
        world,
        motions,
        projectiles,
    };
    activator.activate(skill, &mut ctx, stats, None, None, &mut env, bus)
}
