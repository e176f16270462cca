use crab_kds::demo::random_order;
use crab_kds::{
    InMemoryOrderService, KdsConfig, KitchenDisplay, TerminalBell, TerminalSink, init_logger,
};
use shared::kitchen::{OrderId, OrderStatus};
use shared::util::now_millis;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SEED_ORDERS: u32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 + 配置
    dotenv::dotenv().ok();
    let config = KdsConfig::from_env();

    // 2. 日志
    init_logger(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    tracing::info!("🦀 Crab KDS starting...");

    // 3. 演示数据
    let service = InMemoryOrderService::new();
    let mut rng = rand::thread_rng();
    let now = now_millis();
    for seq in 1..=SEED_ORDERS {
        let order = random_order(&mut rng, seq, &config.kitchen_area, now - i64::from(seq) * 60_000);
        service.put_order(&order);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(generate_orders(
        service.clone(),
        config.clone(),
        shutdown.clone(),
    ));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received");
            }
            shutdown.cancel();
        });
    }

    // 4. 看板
    let display = KitchenDisplay::new(
        &config,
        Arc::new(service.clone()),
        Arc::new(TerminalBell),
        TerminalSink::stdout(),
    );
    let handle = display.handle();

    // 演示：最早的订单一段时间后出餐
    tokio::spawn({
        let service = service.clone();
        let shutdown = shutdown.clone();
        async move {
            let interval = Duration::from_millis(config.demo_interval_ms.max(1) * 3);
            let mut seq = 1;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let id = OrderId::new(format!("demo-{seq}"));
                if service.get(&id).is_some_and(|o| o.status == OrderStatus::InKitchen)
                    && handle.mark_ready(id).await.is_err()
                {
                    break;
                }
                seq += 1;
            }
        }
    });

    display.run(&service, shutdown).await?;
    tracing::info!("Crab KDS stopped");
    Ok(())
}

/// Push a random order every `demo_interval_ms`
async fn generate_orders(service: InMemoryOrderService, config: KdsConfig, shutdown: CancellationToken) {
    let interval = Duration::from_millis(config.demo_interval_ms.max(1));
    let mut seq = SEED_ORDERS + 1;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let order = {
            let mut rng = rand::thread_rng();
            random_order(
                &mut rng,
                seq,
                &config.kitchen_area,
                now_millis(),
            )
        };
        tracing::debug!(order_id = %order.id, "Demo order placed");
        service.put_order(&order);
        seq += 1;
    }
}
