// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

mod health;
mod pppoe;
mod servers;

pub use health::health_check;
pub use pppoe::{add_pppoe_user, list_pppoe_users, list_profiles};
pub use servers::{
    create_server, delete_server, get_server, list_interfaces, list_servers, resources,
    traffic, update_server,
};
