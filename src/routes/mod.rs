pub mod view_route;
