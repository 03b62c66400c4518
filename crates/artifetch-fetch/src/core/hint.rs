use crate::error::TransportError;

const WINDOWS_ALLOW_LIST: &str = "https://aka.ms/windows-agent-allowlist";
const MACOS_ALLOW_LIST: &str = "https://aka.ms/macOS-agent-allowlist";
const LINUX_ALLOW_LIST: &str = "https://aka.ms/linux-agent-allowlist";

/// Documentation page listing the hosts an agent on this platform must reach.
pub fn allow_list_link() -> &'static str {
    if cfg!(windows) {
        WINDOWS_ALLOW_LIST
    } else if cfg!(target_os = "macos") {
        MACOS_ALLOW_LIST
    } else {
        LINUX_ALLOW_LIST
    }
}

/// Warning emitted once when the dedup store cannot be used for a call.
pub fn dedup_fallback_warning(host: &str, error: &TransportError) -> String {
    let mut message = format!(
        "Unable to use the dedup store at {host} ({error}); falling back to streaming downloads. \
         Make sure {host} is allow-listed, see {}",
        allow_list_link()
    );

    if error.is_unreachable() {
        message.push_str(&format!(
            "\nVerify whether you have (network) access to {host}\n\
             URLs the agent needs to communicate with - {}",
            allow_list_link()
        ));
    }

    message
}
