use crate::{
    element::{Element, Node},
    format::{format_bytes, format_last_seen},
    i18n::Locale,
    status::{first_ipv4, first_ipv6, InterfaceStats, PeerNode, ServiceStatus, Snapshot},
};
use chrono::{DateTime, Utc};

pub fn render_content(snapshot: &Snapshot, locale: &Locale) -> Element {
    render_content_at(snapshot, locale, Utc::now())
}

/// Maps a snapshot to the dashboard body. `now` anchors the relative
/// last-seen column.
pub fn render_content_at(snapshot: &Snapshot, locale: &Locale, now: DateTime<Utc>) -> Element {
    let mut elements: Vec<Node> = Vec::new();

    let running = snapshot.status.as_ref().filter(|s| s.is_running());
    if let Some(status) = running {
        if let Some(table) = self_info(status, locale) {
            elements.push(table.into());
        }
    }

    // A report that says the backend is down hides the tunnel interfaces.
    // Without any report they are still the best evidence there is.
    let show_interfaces = snapshot.status.as_ref().map_or(true, ServiceStatus::is_running);
    if show_interfaces && !snapshot.interfaces.is_empty() {
        elements.push(section_heading(locale.tr("Network Interface Information")).into());
        for iface in &snapshot.interfaces {
            elements.push(interface_table(iface, locale).into());
        }
    }

    if let Some(status) = running {
        if !status.peers.is_empty() {
            elements.push(section_heading(locale.tr("Network Devices")).into());
            elements.push(peer_table(status, locale, now).into());
        }
    }

    // With neither a status report nor a tunnel interface there is nothing
    // to show, not even the service state.
    if snapshot.status.is_none() && elements.is_empty() {
        return Element::new("div").text(locale.tr("No interface online."));
    }
    Element::new("div")
        .children(service_status(snapshot.status.as_ref(), locale))
        .children(elements)
}

fn service_status(status: Option<&ServiceStatus>, locale: &Locale) -> [Node; 2] {
    let running = status.map_or(false, ServiceStatus::is_running);
    let (color, text) = if running {
        ("green", locale.tr("RUNNING"))
    } else {
        ("red", locale.tr("NOT RUNNING"))
    };

    let mut line = Element::new("p").child(
        Element::new("span")
            .style(format!("color:{color};font-weight:bold;"))
            .text(text),
    );
    if let Some(version) = status.and_then(|s| s.version.as_deref()) {
        if !version.is_empty() {
            line = line.child(Element::new("span").text(format!(" (v{version})")));
        }
    }

    [
        Element::new("h3").text(locale.tr("Service Status")).into(),
        line.into(),
    ]
}

fn section_heading(text: String) -> Element {
    Element::new("h3").style("margin-top:20px;").text(text)
}

fn kv_row(key: impl Into<String>, value: impl Into<String>) -> Element {
    Element::new("tr")
        .child(Element::new("td").text(key))
        .child(Element::new("td").text(value))
}

fn self_info(status: &ServiceStatus, locale: &Locale) -> Option<Element> {
    let self_node = status.self_node.as_ref()?;
    let mut rows = Vec::new();
    if let Some(ip) = first_ipv4(&self_node.tailscale_ips) {
        rows.push(kv_row("Tailscale IPv4", ip));
    }
    if let Some(ip) = first_ipv6(&self_node.tailscale_ips) {
        rows.push(kv_row("Tailscale IPv6", ip));
    }
    match status.magic_dns_suffix.as_deref() {
        Some(domain) if !domain.is_empty() => rows.push(kv_row(locale.tr("Tailnet"), domain)),
        _ => {}
    }
    if rows.is_empty() {
        return None;
    }
    Some(Element::new("table").class("table").children(rows))
}

fn interface_table(iface: &InterfaceStats, locale: &Locale) -> Element {
    let mtu = iface.mtu.map(|m| m.to_string()).unwrap_or_default();
    Element::new("table").class("table").children([
        Element::new("tr")
            .child(
                Element::new("td")
                    .attr("width", "30%")
                    .text(locale.tr("Interface Name")),
            )
            .child(Element::new("td").text(iface.name.as_str())),
        kv_row(locale.tr("IPv4 Address"), iface.ipv4.as_deref().unwrap_or("-")),
        kv_row(locale.tr("IPv6 Address"), iface.ipv6.as_deref().unwrap_or("-")),
        kv_row(locale.tr("MTU"), mtu),
        kv_row(locale.tr("Total Download"), format_bytes(iface.rx_bytes)),
        kv_row(locale.tr("Total Upload"), format_bytes(iface.tx_bytes)),
    ])
}

fn peer_table(status: &ServiceStatus, locale: &Locale, now: DateTime<Utc>) -> Element {
    let titles = [
        "Status",
        "Hostname",
        "Tailscale IP",
        "OS",
        "RX",
        "TX",
        "Last Seen",
    ];
    let header = Element::new("tr")
        .class("tr cbi-section-table-titles")
        .children(
            titles
                .iter()
                .map(|t| Element::new("th").class("th").text(locale.tr(t))),
        );

    let rows = status
        .peers
        .iter()
        .map(|(_, peer)| peer_row(peer, locale, now));

    Element::new("table")
        .class("table cbi-section-table")
        .child(header)
        .children(rows)
}

fn peer_row(peer: &PeerNode, locale: &Locale, now: DateTime<Utc>) -> Element {
    let (color, dot) = if peer.online {
        ("green", "●")
    } else {
        ("gray", "○")
    };
    let last_seen = if peer.online {
        locale.tr("Online")
    } else {
        format_last_seen(peer.last_seen.as_deref(), now, locale)
    };
    let cell = |text: String| Element::new("td").class("td").text(text);

    Element::new("tr").class("tr").children([
        Element::new("td")
            .class("td")
            .child(Element::new("span").style(format!("color:{color};")).text(dot)),
        cell(peer.host_name.clone().unwrap_or_else(|| "-".into())),
        cell(first_ipv4(&peer.tailscale_ips).unwrap_or("-").to_string()),
        cell(peer.os.clone().unwrap_or_else(|| "-".into())),
        cell(format_bytes(peer.rx_bytes)),
        cell(format_bytes(peer.tx_bytes)),
        cell(last_seen),
    ])
}
