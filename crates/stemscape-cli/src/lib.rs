pub mod stemness;
