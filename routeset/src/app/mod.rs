pub mod route_choice;
