use embassy_net::Stack;
use embassy_time::{Duration, Timer, WithTimeout};
use esp_radio::wifi::WifiController;
use log::info;

use super::LinkHandle;

const DHCP_TIMEOUT_SECS: u64 = 15;
const LINK_POLL_INTERVAL_MS: u64 = 500;

/// Joins the configured network when the supervisor asks, then publishes
/// link + IPv4 status until the link drops.
///
/// A join request that arrives while a join is in progress, or while the
/// link is healthy, never restarts it; a healthy link is simply reported up
/// again.
pub async fn wifi_worker(
    controller: &mut WifiController<'_>,
    stack: Stack<'_>,
    link: &'static LinkHandle,
) -> ! {
    loop {
        link.begin.wait().await;

        if is_healthy(controller, stack) {
            info!("wifi: join requested while connected; keeping link");
        } else {
            link.set_up(false);
            if !join(controller, stack).await {
                continue;
            }
            info!("wifi: connected, ipv4 ready");
        }

        loop {
            let up = is_healthy(controller, stack);
            link.set_up(up);

            if !up {
                info!("wifi: link lost");
                break;
            }

            Timer::after_millis(LINK_POLL_INTERVAL_MS).await;
        }
    }
}

fn is_healthy(controller: &WifiController<'_>, stack: Stack<'_>) -> bool {
    stack.is_link_up()
        && stack.config_v4().is_some()
        && matches!(controller.is_connected(), Ok(true))
}

async fn join(controller: &mut WifiController<'_>, stack: Stack<'_>) -> bool {
    if matches!(controller.is_connected(), Ok(true)) {
        let _ = controller.disconnect_async().await;
    }

    if !controller.is_started().unwrap_or(false)
        && let Err(err) = controller.start_async().await
    {
        info!("wifi: start failed: {:?}", err);
        return false;
    }

    if let Err(err) = controller.connect_async().await {
        info!("wifi: connect failed: {:?}", err);
        return false;
    }

    if stack
        .wait_config_up()
        .with_timeout(Duration::from_secs(DHCP_TIMEOUT_SECS))
        .await
        .is_err()
    {
        info!("wifi: dhcp timeout");
        let _ = controller.disconnect_async().await;
        return false;
    }

    true
}
