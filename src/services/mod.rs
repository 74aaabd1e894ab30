pub mod geo_service;
