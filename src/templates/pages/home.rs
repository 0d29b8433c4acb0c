// templates/pages/home.rs

use crate::domain::listing::{Amenidades, TipoOperacion, TipoPropiedad};
use crate::templates::desktop_layout;
use maud::{html, Markup};

const TIPOS: [TipoPropiedad; 6] = [
    TipoPropiedad::Casa,
    TipoPropiedad::Departamento,
    TipoPropiedad::Terreno,
    TipoPropiedad::Local,
    TipoPropiedad::Oficina,
    TipoPropiedad::Bodega,
];

fn amenity_label(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Catalog page. Filtering and paging happen in the browser over /catalogo.json.
pub fn home_page(user: Option<&str>, ciudades: &[&str], total: usize) -> Markup {
    desktop_layout(
        "Catálogo",
        user,
        html! {
            main class="container" {
                h1 { "Catálogo de propiedades" }
                p class="lead" { (total) " propiedades disponibles" }

                form id="filtros" class="filters" {
                    input type="search" name="q" placeholder="Buscar por título, colonia o ciudad";

                    select name="ciudad" {
                        option value="" { "Todas las ciudades" }
                        @for c in ciudades {
                            option value=(c) { (c) }
                        }
                    }
                    select name="tipo_propiedad" {
                        option value="" { "Cualquier tipo" }
                        @for t in TIPOS {
                            option value=(t) { (t) }
                        }
                    }
                    select name="tipo_operacion" {
                        option value="" { "Venta o renta" }
                        @for o in [TipoOperacion::Venta, TipoOperacion::Renta] {
                            option value=(o) { (o) }
                        }
                    }
                    input type="number" name="precio_min" min="0" step="1000" placeholder="Precio mínimo";
                    input type="number" name="precio_max" min="0" step="1000" placeholder="Precio máximo";
                    select name="orden_precio" {
                        option value="" { "Sin orden" }
                        option value="menor_mayor" { "Precio: menor a mayor" }
                        option value="mayor_menor" { "Precio: mayor a menor" }
                    }

                    fieldset class="amenities" {
                        legend { "Amenidades" }
                        @for name in Amenidades::NAMES {
                            label {
                                input type="checkbox" name="amenidades" value=(name);
                                " " (amenity_label(name))
                            }
                        }
                    }
                }

                p id="conteo" class="muted" {}
                div id="resultados" class="grid" {
                    noscript { p { "Activa JavaScript o consulta " a href="/api/propiedades" { "/api/propiedades" } "." } }
                }
                nav id="paginacion" class="pagination" {}
            }
            script src="/static/catalogo.js" defer {}
        },
    )
}
