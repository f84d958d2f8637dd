use crate::models::{
    AndroidConfig, AndroidNotification, FcmMessage, Message, WireMessage, WireNotification,
};

/// Build the single-recipient v1 message for `target`.
///
/// Expects a message that already passed validation. Click action and tag
/// have no place in the shared notification at this API level, so they move
/// under the Android block together with the priority.
pub fn translate(message: &Message, target: &str) -> WireMessage {
    let notification = &message.notification;

    WireMessage {
        token: target.to_string(),
        collapse_key: message.collapse_key.clone(),
        notification: WireNotification {
            title: notification.title.clone(),
            body: notification.body.clone(),
        },
        data: message.data.clone(),
        delay_while_idle: message.delay_while_idle,
        time_to_live: message.time_to_live,
        restricted_package_name: message.restricted_package_name.clone(),
        dry_run: message.dry_run,
        android: AndroidConfig {
            notification: AndroidNotification {
                click_action: notification.click_action.clone(),
                tag: notification.tag.clone(),
            },
            priority: message.priority.clone().filter(|p| !p.is_empty()),
        },
    }
}

/// One wire message per target, in target order
pub fn translate_all(message: &Message) -> impl Iterator<Item = FcmMessage> + '_ {
    message.targets().iter().map(move |target| FcmMessage {
        message: translate(message, target),
    })
}
